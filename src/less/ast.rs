//! Syntax tree produced by the parser.

/// A parsed stylesheet: the top-level sequence of rulesets and variable
/// declarations.
#[derive(Debug)]
pub(crate) struct Stylesheet {
    pub(crate) items: Vec<Item>,
}

#[derive(Debug)]
pub(crate) enum Item {
    Variable(VariableDecl),
    Ruleset(Ruleset),
    Declaration(Declaration),
}

/// `@name: value;`
#[derive(Debug)]
pub(crate) struct VariableDecl {
    pub(crate) name: String,
    pub(crate) value: Value,
}

/// A selector group and the block it introduces. Nested rulesets stay
/// nested here; flattening happens during evaluation.
#[derive(Debug)]
pub(crate) struct Ruleset {
    pub(crate) selectors: Vec<String>,
    pub(crate) items: Vec<Item>,
}

/// `property: value` inside a block.
#[derive(Debug)]
pub(crate) struct Declaration {
    pub(crate) property: String,
    pub(crate) value: Value,
}

/// A property or variable value, split at variable references so the
/// evaluator can substitute them without rescanning text.
#[derive(Debug)]
pub(crate) struct Value {
    pub(crate) parts: Vec<ValuePart>,
}

#[derive(Debug)]
pub(crate) enum ValuePart {
    /// Literal text, whitespace already collapsed.
    Raw(String),
    /// `@name` reference, stored without the `@`.
    Variable(String),
}
