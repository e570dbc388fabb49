//! Tokenizer for address expressions

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LBracket,
    RBracket,
    Plus,
    Minus,
    Ident(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the source
    pub position: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let kind = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'[' => {
                i += 1;
                TokenKind::LBracket
            }
            b']' => {
                i += 1;
                TokenKind::RBracket
            }
            b'+' => {
                i += 1;
                TokenKind::Plus
            }
            b'-' => {
                i += 1;
                TokenKind::Minus
            }
            b'0'..=b'9' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                TokenKind::Int(parse_int(&source[start..i], start)?)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                TokenKind::Ident(source[start..i].to_string())
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(Error::syntax(start, format!("unexpected character '{}'", ch)));
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
    }

    Ok(tokens)
}

/// Parse an integer literal: decimal, `0x` hex, `0o` octal or `0b` binary
fn parse_int(text: &str, position: usize) -> Result<i64> {
    let lower = text.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() {
        return Err(Error::syntax(position, format!("invalid integer '{}'", text)));
    }

    i64::from_str_radix(&digits, radix)
        .map_err(|e| Error::syntax(position, format!("invalid integer '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_expression() {
        assert_eq!(
            kinds("[[Beatmap] + 0x18]"),
            vec![
                TokenKind::LBracket,
                TokenKind::LBracket,
                TokenKind::Ident("Beatmap".to_string()),
                TokenKind::RBracket,
                TokenKind::Plus,
                TokenKind::Int(0x18),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_integer_forms() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42)]);
        assert_eq!(kinds("0xC"), vec![TokenKind::Int(12)]);
        assert_eq!(kinds("0XFF"), vec![TokenKind::Int(255)]);
        assert_eq!(kinds("0o17"), vec![TokenKind::Int(15)]);
        assert_eq!(kinds("0b101"), vec![TokenKind::Int(5)]);
        assert_eq!(kinds("1_000"), vec![TokenKind::Int(1000)]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("Base -  0x33").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 5, 8]);
    }

    #[test]
    fn test_invalid_integer() {
        assert!(matches!(
            tokenize("0xZZ"),
            Err(Error::ExpressionSyntax { position: 0, .. })
        ));
        assert!(tokenize("0x").is_err());
        assert!(tokenize("12abc").is_err());
        assert!(tokenize("0xFFFFFFFFFFFFFFFFFF").is_err());
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("Base * 2").unwrap_err();
        assert!(matches!(err, Error::ExpressionSyntax { position: 5, .. }));
    }
}
