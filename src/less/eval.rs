//! Evaluation: variable substitution and ruleset flattening.
//!
//! Variables are lazy. Every block first registers all of its variable
//! declarations, then its declarations are resolved, so a reference may
//! appear before its definition and the last definition in a scope is
//! the one that counts. Inner scopes shadow outer ones.

use std::collections::HashMap;

use super::ast::{Item, Ruleset, Stylesheet, Value, ValuePart};
use super::error::CompileError;

/// A flattened rule ready for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CssRule {
    pub(crate) selectors: Vec<String>,
    pub(crate) declarations: Vec<CssDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CssDeclaration {
    pub(crate) property: String,
    pub(crate) value: String,
}

pub(crate) fn evaluate(sheet: &Stylesheet) -> Result<Vec<CssRule>, CompileError> {
    let mut scope = Scope::default();
    scope.push_frame(&sheet.items);
    let mut rules = Vec::new();
    for item in &sheet.items {
        if let Item::Ruleset(ruleset) = item {
            flatten_ruleset(ruleset, &[], &mut scope, &mut rules)?;
        }
    }
    Ok(rules)
}

fn flatten_ruleset<'a>(
    ruleset: &'a Ruleset,
    parents: &[String],
    scope: &mut Scope<'a>,
    rules: &mut Vec<CssRule>,
) -> Result<(), CompileError> {
    let selectors = combine_selectors(parents, &ruleset.selectors);
    scope.push_frame(&ruleset.items);

    let mut declarations = Vec::new();
    for item in &ruleset.items {
        if let Item::Declaration(declaration) = item {
            declarations.push(CssDeclaration {
                property: declaration.property.clone(),
                value: scope.resolve(&declaration.value)?,
            });
        }
    }
    if !declarations.is_empty() {
        rules.push(CssRule {
            selectors: selectors.clone(),
            declarations,
        });
    }

    // Child rulesets come after the parent's own rule, in source order.
    for item in &ruleset.items {
        if let Item::Ruleset(child) = item {
            flatten_ruleset(child, &selectors, scope, rules)?;
        }
    }

    scope.pop_frame();
    Ok(())
}

/// Cartesian product of parent and child selector groups. A `&` in the
/// child splices the parent selector in place; otherwise the two are
/// joined with a descendant combinator.
fn combine_selectors(parents: &[String], children: &[String]) -> Vec<String> {
    if parents.is_empty() {
        return children.to_vec();
    }
    let mut combined = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in children {
            if child.contains('&') {
                combined.push(child.replace('&', parent));
            } else {
                combined.push(format!("{parent} {child}"));
            }
        }
    }
    combined
}

/// Stack of variable frames, innermost last. Each frame maps a name to
/// the last value declared for it in that block.
#[derive(Default)]
struct Scope<'a> {
    frames: Vec<HashMap<&'a str, &'a Value>>,
}

impl<'a> Scope<'a> {
    fn push_frame(&mut self, items: &'a [Item]) {
        let mut frame = HashMap::new();
        for item in items {
            if let Item::Variable(var) = item {
                frame.insert(var.name.as_str(), &var.value);
            }
        }
        self.frames.push(frame);
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name).copied())
    }

    fn resolve(&self, value: &Value) -> Result<String, CompileError> {
        let mut resolved = String::new();
        let mut active = Vec::new();
        self.resolve_into(value, &mut resolved, &mut active)?;
        Ok(resolved)
    }

    fn resolve_into(
        &self,
        value: &Value,
        out: &mut String,
        active: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        for part in &value.parts {
            match part {
                ValuePart::Raw(text) => out.push_str(text),
                ValuePart::Variable(name) => {
                    if active.iter().any(|seen| seen == name) {
                        return Err(CompileError::CircularVariable { name: name.clone() });
                    }
                    let Some(referenced) = self.lookup(name) else {
                        return Err(CompileError::UndefinedVariable { name: name.clone() });
                    };
                    active.push(name.clone());
                    self.resolve_into(referenced, out, active)?;
                    active.pop();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn eval(source: &str) -> Vec<CssRule> {
        evaluate(&parse(source).unwrap()).unwrap()
    }

    fn eval_err(source: &str) -> CompileError {
        evaluate(&parse(source).unwrap()).unwrap_err()
    }

    #[test]
    fn test_variable_used_before_definition() {
        let rules = eval(".a { color: @c; } @c: red;");
        assert_eq!(rules[0].declarations[0].value, "red");
    }

    #[test]
    fn test_last_definition_wins() {
        let rules = eval("@c: blue; .a { color: @c; } @c: green;");
        assert_eq!(rules[0].declarations[0].value, "green");
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let rules = eval("@c: red; .a { @c: blue; color: @c; } .b { color: @c; }");
        assert_eq!(rules[0].declarations[0].value, "blue");
        assert_eq!(rules[1].declarations[0].value, "red");
    }

    #[test]
    fn test_variable_referencing_variable() {
        let rules = eval("@base: #333; @edge: 1px solid @base; .a { border: @edge; }");
        assert_eq!(rules[0].declarations[0].value, "1px solid #333");
    }

    #[test]
    fn test_undefined_variable() {
        let err = eval_err(".a { color: @nope; }");
        match err {
            CompileError::UndefinedVariable { name } => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_referential_variable() {
        let err = eval_err("@c: @c; .a { color: @c; }");
        assert!(matches!(err, CompileError::CircularVariable { .. }));
    }

    #[test]
    fn test_mutually_recursive_variables() {
        let err = eval_err("@a: @b; @b: @a; .x { top: @a; }");
        assert!(matches!(err, CompileError::CircularVariable { .. }));
    }

    #[test]
    fn test_nested_ruleset_flattens_with_descendant_combinator() {
        let rules = eval(".nav { color: red; .item { color: blue; } }");
        assert_eq!(rules[0].selectors, vec![".nav"]);
        assert_eq!(rules[1].selectors, vec![".nav .item"]);
    }

    #[test]
    fn test_parent_reference_splices() {
        let rules = eval(".job { &.failed { color: red; } &:hover { color: blue; } }");
        assert_eq!(rules[0].selectors, vec![".job.failed"]);
        assert_eq!(rules[1].selectors, vec![".job:hover"]);
    }

    #[test]
    fn test_comma_groups_multiply_parent_major() {
        let rules = eval(".a, .b { .c, .d { color: red; } }");
        assert_eq!(rules[0].selectors, vec![".a .c", ".a .d", ".b .c", ".b .d"]);
    }

    #[test]
    fn test_empty_ruleset_produces_no_rule() {
        let rules = eval(".a { } .b { color: red; }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selectors, vec![".b"]);
    }

    #[test]
    fn test_parent_with_only_nested_children_is_omitted() {
        let rules = eval(".a { .b { color: red; } }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selectors, vec![".a .b"]);
    }

    #[test]
    fn test_deeply_nested_scopes() {
        let rules = eval("@c: red; .a { @c: blue; .b { .c { color: @c; } } }");
        assert_eq!(rules[0].selectors, vec![".a .b .c"]);
        assert_eq!(rules[0].declarations[0].value, "blue");
    }
}
