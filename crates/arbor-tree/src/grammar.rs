//! Expression grammar shared by node types and conditions.
//!
//! ```text
//! expr   := ident params? args?
//! params := '{' <any text without '}'> '}'
//! args   := '(' expr (',' expr)* ')'
//! ident  := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! `Idle{500}` names a node type with parameters, and
//! `And(HasEnemies{2},Not(Random{0.1}))` a composite condition. Whitespace
//! between tokens is ignored. The grammar only produces an [`Expression`]
//! tree; resolving names to behavior is the registry's job.

use crate::error::TreeError;

/// A parsed, not yet resolved, expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// The leading identifier.
    pub name: String,
    /// Text between the braces, trimmed; empty when absent.
    pub parameters: String,
    /// Nested argument expressions in order.
    pub arguments: Vec<Expression>,
}

/// Parse a complete expression. Trailing input is an error.
pub fn parse_expression(input: &str) -> Result<Expression, TreeError> {
    let mut cursor = Cursor { input, pos: 0 };
    let expression = cursor.expression()?;
    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(cursor.error("unexpected trailing input"));
    }
    Ok(expression)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos = self.pos.saturating_add(c.len_utf8());
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            let _ = self.bump();
        }
    }

    fn error(&self, message: &str) -> TreeError {
        TreeError::Syntax {
            expression: self.input.to_owned(),
            position: self.pos,
            message: message.to_owned(),
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), TreeError> {
        self.skip_whitespace();
        if self.peek() == Some(wanted) {
            let _ = self.bump();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{wanted}'")))
        }
    }

    fn expression(&mut self) -> Result<Expression, TreeError> {
        let name = self.identifier()?;
        self.skip_whitespace();

        let mut parameters = String::new();
        if self.peek() == Some('{') {
            let _ = self.bump();
            let start = self.pos;
            while self.peek().is_some_and(|c| c != '}') {
                let _ = self.bump();
            }
            let input = self.input;
            let text = input.get(start..self.pos).unwrap_or_default();
            self.expect('}')?;
            parameters = text.trim().to_owned();
            self.skip_whitespace();
        }

        let mut arguments = Vec::new();
        if self.peek() == Some('(') {
            let _ = self.bump();
            loop {
                self.skip_whitespace();
                arguments.push(self.expression()?);
                self.skip_whitespace();
                match self.bump() {
                    Some(',') => {}
                    Some(')') => break,
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }

        Ok(Expression {
            name,
            parameters,
            arguments,
        })
    }

    fn identifier(&mut self) -> Result<String, TreeError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let _ = self.bump();
            }
            _ => return Err(self.error("expected identifier")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            let _ = self.bump();
        }
        Ok(self.input.get(start..self.pos).unwrap_or_default().to_owned())
    }
}
