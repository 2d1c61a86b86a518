//! Hand-written recursive-descent parser for the LESS subset.
//!
//! The grammar is small enough that a character-level scanner with one
//! non-consuming lookahead pass per item keeps the code short. The
//! lookahead decides whether the upcoming text is a ruleset or a
//! declaration by finding which of `{`, `;` or `}` comes first outside
//! strings and brackets.

use super::ast::{Declaration, Item, Ruleset, Stylesheet, Value, ValuePart, VariableDecl};
use super::error::CompileError;

pub(crate) fn parse(source: &str) -> Result<Stylesheet, CompileError> {
    Parser::new(source).parse_stylesheet()
}

/// What the lookahead found first at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Ruleset,
    Declaration,
}

#[derive(Clone, Copy)]
struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        parse_error(self.line, self.column, message)
    }

    /// Skips whitespace, `//` line comments and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(parse_error(line, column, "unterminated comment"));
                            }
                            Some('*') if self.peek_second() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consumes a quoted string including both quotes. The caller must
    /// have checked that the next character is a quote.
    fn skip_string(&mut self) -> Result<(), CompileError> {
        let (line, column) = (self.line, self.column);
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(parse_error(line, column, "unterminated string"));
                }
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn parse_ident(&mut self) -> Result<String, CompileError> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.error("expected an identifier")),
        }
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(ident)
    }

    /// Non-consuming lookahead: scans forward over a copy of the cursor
    /// until the first `{`, `;` or `}` outside strings and brackets.
    fn classify_item(&self) -> Result<ItemKind, CompileError> {
        let mut scan = *self;
        let mut depth = 0usize;
        loop {
            scan.skip_trivia()?;
            let Some(c) = scan.peek() else {
                return Err(scan.error("unexpected end of input"));
            };
            match c {
                '"' | '\'' => scan.skip_string()?,
                '(' => {
                    // A url(...) body is skipped whole so its text is
                    // never mistaken for comments or delimiters.
                    let opens_url = is_url_keyword(&scan.src[..scan.pos]);
                    scan.bump();
                    if opens_url {
                        scan.skip_url_body()?;
                    } else {
                        depth += 1;
                    }
                }
                '[' => {
                    depth += 1;
                    scan.bump();
                }
                ')' | ']' => {
                    depth = depth.saturating_sub(1);
                    scan.bump();
                }
                '{' if depth == 0 => return Ok(ItemKind::Ruleset),
                ';' | '}' if depth == 0 => return Ok(ItemKind::Declaration),
                _ => {
                    scan.bump();
                }
            }
        }
    }

    fn parse_stylesheet(&mut self) -> Result<Stylesheet, CompileError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Ok(Stylesheet { items }),
                Some('}') => return Err(self.error("unexpected `}`")),
                Some('@') => items.push(self.parse_at_item()?),
                Some(_) => match self.classify_item()? {
                    ItemKind::Ruleset => items.push(Item::Ruleset(self.parse_ruleset()?)),
                    ItemKind::Declaration => {
                        return Err(self.error("declaration found outside a ruleset"));
                    }
                },
            }
        }
    }

    /// Parses either a variable declaration (`@name: value;`) or rejects
    /// an at-rule. The `@` has not been consumed yet.
    fn parse_at_item(&mut self) -> Result<Item, CompileError> {
        let at_line = self.line;
        self.bump();
        let name = self.parse_ident()?;
        self.skip_trivia()?;
        if self.peek() == Some(':') {
            self.bump();
            self.skip_trivia()?;
            let value = self.parse_value()?;
            if self.peek() == Some(';') {
                self.bump();
            }
            Ok(Item::Variable(VariableDecl { name, value }))
        } else {
            Err(CompileError::Unsupported {
                directive: name,
                line: at_line,
            })
        }
    }

    fn parse_ruleset(&mut self) -> Result<Ruleset, CompileError> {
        let selectors = self.parse_selector_group()?;
        let items = self.parse_block_items()?;
        Ok(Ruleset { selectors, items })
    }

    /// Parses a comma-separated selector group up to and including the
    /// opening `{`. Whitespace runs inside a selector collapse to a
    /// single space; commas inside `(...)` or `[...]` do not split.
    fn parse_selector_group(&mut self) -> Result<Vec<String>, CompileError> {
        let mut selectors = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unexpected end of input; expected `{`"));
            };
            match c {
                '{' if depth == 0 => {
                    self.bump();
                    break;
                }
                ',' if depth == 0 => {
                    self.push_selector(&mut selectors, &current)?;
                    current.clear();
                    self.bump();
                }
                '"' | '\'' => {
                    let start = self.pos;
                    self.skip_string()?;
                    current.push_str(&self.src[start..self.pos]);
                }
                '(' | '[' => {
                    depth += 1;
                    current.push(c);
                    self.bump();
                }
                ')' | ']' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                    self.bump();
                }
                '/' if matches!(self.peek_second(), Some('/' | '*')) => {
                    self.skip_trivia()?;
                    push_collapsed_space(&mut current);
                }
                c if c.is_whitespace() => {
                    self.bump();
                    push_collapsed_space(&mut current);
                }
                _ => {
                    current.push(c);
                    self.bump();
                }
            }
        }
        self.push_selector(&mut selectors, &current)?;
        Ok(selectors)
    }

    fn push_selector(
        &self,
        selectors: &mut Vec<String>,
        raw: &str,
    ) -> Result<(), CompileError> {
        let selector = raw.trim().to_string();
        if selector.is_empty() {
            return Err(self.error("empty selector"));
        }
        selectors.push(selector);
        Ok(())
    }

    /// Parses the items between `{` and `}`. The opening brace has
    /// already been consumed; the closing one is consumed here.
    fn parse_block_items(&mut self) -> Result<Vec<Item>, CompileError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(self.error("unexpected end of input; expected `}`")),
                Some('}') => {
                    self.bump();
                    return Ok(items);
                }
                Some('@') => items.push(self.parse_at_item()?),
                Some(_) => match self.classify_item()? {
                    ItemKind::Ruleset => items.push(Item::Ruleset(self.parse_ruleset()?)),
                    ItemKind::Declaration => {
                        items.push(Item::Declaration(self.parse_declaration()?));
                    }
                },
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Declaration, CompileError> {
        let property = self.parse_ident()?;
        self.skip_trivia()?;
        if self.peek() == Some(':') {
            self.bump();
        } else {
            return Err(self.error("expected `:` after property name"));
        }
        self.skip_trivia()?;
        let value = self.parse_value()?;
        if self.peek() == Some(';') {
            self.bump();
        }
        Ok(Declaration { property, value })
    }

    /// Parses a value up to an unbracketed `;` or `}` (neither is
    /// consumed for `}`). Variable references outside strings and
    /// `url(...)` become [`ValuePart::Variable`]; everything else stays
    /// literal with whitespace collapsed.
    fn parse_value(&mut self) -> Result<Value, CompileError> {
        let mut parts: Vec<ValuePart> = Vec::new();
        let mut raw = String::new();
        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek() else { break };
            match c {
                ';' | '}' if depth == 0 => break,
                '@' => {
                    self.bump();
                    if self.peek().is_some_and(is_ident_start) {
                        flush_raw(&mut parts, &mut raw);
                        let name = self.parse_ident()?;
                        parts.push(ValuePart::Variable(name));
                    } else {
                        raw.push('@');
                    }
                }
                '"' | '\'' => {
                    let start = self.pos;
                    self.skip_string()?;
                    raw.push_str(&self.src[start..self.pos]);
                }
                '(' => {
                    let opens_url = is_url_keyword(&raw);
                    self.bump();
                    raw.push('(');
                    if opens_url {
                        self.consume_url_body(&mut raw)?;
                    } else {
                        depth += 1;
                    }
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    raw.push(')');
                    self.bump();
                }
                '/' if matches!(self.peek_second(), Some('/' | '*')) => {
                    self.skip_trivia()?;
                    push_value_space(&parts, &mut raw);
                }
                c if c.is_whitespace() => {
                    self.bump();
                    push_value_space(&parts, &mut raw);
                }
                _ => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
        raw.truncate(raw.trim_end().len());
        flush_raw(&mut parts, &mut raw);
        if parts.is_empty() {
            return Err(self.error("expected a value"));
        }
        Ok(Value { parts })
    }

    /// Skips a `url(...)` body through the closing `)`. Quoted strings
    /// are honored; nothing else inside is interpreted, so `//` in a
    /// URL is not mistaken for a comment.
    fn skip_url_body(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated `url(`")),
                Some('"' | '\'') => self.skip_string()?,
                Some(')') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Consumes the remainder of a `url(...)` token verbatim, through
    /// the closing `)`.
    fn consume_url_body(&mut self, raw: &mut String) -> Result<(), CompileError> {
        let start = self.pos;
        self.skip_url_body()?;
        raw.push_str(&self.src[start..self.pos]);
        Ok(())
    }
}

fn parse_error(line: usize, column: usize, message: impl Into<String>) -> CompileError {
    CompileError::Parse {
        line,
        column,
        message: message.into(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '_'
}

fn flush_raw(parts: &mut Vec<ValuePart>, raw: &mut String) {
    if !raw.is_empty() {
        parts.push(ValuePart::Raw(std::mem::take(raw)));
    }
}

/// Appends one space unless the buffer is empty or already ends with one.
fn push_collapsed_space(buffer: &mut String) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
}

/// Records one space in the value buffer, collapsing runs. An empty
/// buffer still takes the space when earlier parts exist; that gap is
/// the separator after a flushed variable reference and must survive
/// substitution.
fn push_value_space(parts: &[ValuePart], raw: &mut String) {
    if raw.is_empty() {
        if !parts.is_empty() {
            raw.push(' ');
        }
    } else if !raw.ends_with(' ') {
        raw.push(' ');
    }
}

/// True when the text before an opening paren ends with the `url`
/// keyword, with no identifier character glued in front (so `curl(`
/// does not count).
fn is_url_keyword(before: &str) -> bool {
    let bytes = before.as_bytes();
    if bytes.len() < 3 {
        return false;
    }
    let (head, tail) = bytes.split_at(bytes.len() - 3);
    if !tail.eq_ignore_ascii_case(b"url") {
        return false;
    }
    !head
        .last()
        .is_some_and(|&c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
}
