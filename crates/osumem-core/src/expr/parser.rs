//! Recursive-descent parser
//!
//! ```text
//! expr := term (('+' | '-') expr)?
//! term := '[' expr ']' | IDENT | INTEGER
//! ```
//!
//! The operator binds everything to its right, so `a - b + c` is
//! `a - (b + c)`.

use super::Expr;
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{Error, Result};

pub(crate) fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: source.len(),
    };

    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(Error::syntax(
            token.position,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Position reported for errors at end of input
    end: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Expr> {
        let lhs = self.term()?;
        let subtract = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => false,
            Some(TokenKind::Minus) => true,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.expr()?;
        Ok(if subtract {
            Expr::Sub(Box::new(lhs), Box::new(rhs))
        } else {
            Expr::Add(Box::new(lhs), Box::new(rhs))
        })
    }

    fn term(&mut self) -> Result<Expr> {
        let Some(token) = self.next() else {
            return Err(Error::syntax(self.end, "expected operand, found end of input"));
        };

        match &token.kind {
            TokenKind::Int(value) => Ok(Expr::Literal(*value)),
            TokenKind::Ident(name) => Ok(Expr::Variable(name.clone())),
            TokenKind::LBracket => {
                let open = token.position;
                let inner = self.expr()?;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RBracket,
                        ..
                    }) => Ok(Expr::Deref(Box::new(inner))),
                    Some(other) => Err(Error::syntax(
                        other.position,
                        format!("expected ']', found {}", describe(&other.kind)),
                    )),
                    None => Err(Error::syntax(open, "unclosed '[' at end of input")),
                }
            }
            other => Err(Error::syntax(
                token.position,
                format!("expected operand, found {}", describe(other)),
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Int(value) => format!("integer {}", value),
    }
}
