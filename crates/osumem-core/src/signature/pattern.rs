use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const GROUP: usize = 4;

/// A compiled byte signature
///
/// Tokens are packed four at a time into little-endian `(value, mask)` words.
/// A wildcard contributes a zero mask byte, so it never takes part in a
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    values: Vec<u32>,
    masks: Vec<u32>,
    /// Index of the first concrete byte inside the first group
    anchor: usize,
}

impl Pattern {
    pub fn compile(signature: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (index, token) in signature.split_whitespace().enumerate() {
            tokens.push(parse_token(token).ok_or_else(|| {
                Error::PatternSyntax(format!(
                    "invalid token '{}' at index {} in '{}'",
                    token, index, signature
                ))
            })?);
        }

        let mut values = Vec::with_capacity(tokens.len() / GROUP);
        let mut masks = Vec::with_capacity(tokens.len() / GROUP);
        for chunk in tokens.chunks_exact(GROUP) {
            let mut value = [0u8; GROUP];
            let mut mask = [0u8; GROUP];
            for (i, token) in chunk.iter().enumerate() {
                if let Some(byte) = token {
                    value[i] = *byte;
                    mask[i] = 0xFF;
                }
            }
            values.push(u32::from_le_bytes(value));
            masks.push(u32::from_le_bytes(mask));
        }

        if values.is_empty() {
            return Err(Error::PatternSyntax(format!(
                "'{}' has no complete {}-byte group",
                signature, GROUP
            )));
        }

        let anchor = tokens[..GROUP]
            .iter()
            .position(Option::is_some)
            .ok_or_else(|| {
                Error::PatternSyntax(format!(
                    "'{}' starts with {} wildcards",
                    signature, GROUP
                ))
            })?;

        Ok(Self {
            source: signature.to_string(),
            values,
            masks,
            anchor,
        })
    }

    /// The signature text this pattern was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Matched length in bytes
    pub fn len(&self) -> usize {
        self.values.len() * GROUP
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn anchor_byte(&self) -> u8 {
        self.values[0].to_le_bytes()[self.anchor]
    }

    /// Check the pattern against the start of `window`
    fn matches(&self, window: &[u8]) -> bool {
        window
            .chunks_exact(GROUP)
            .zip(self.values.iter().zip(&self.masks))
            .all(|(bytes, (value, mask))| {
                let mut raw = [0u8; GROUP];
                raw.copy_from_slice(bytes);
                (u32::from_le_bytes(raw) ^ value) & mask == 0
            })
    }

    /// Offset of the first match in `haystack`
    pub fn find_in(&self, haystack: &[u8]) -> Option<usize> {
        let len = self.len();
        if haystack.len() < len {
            return None;
        }

        let anchor_byte = self.anchor_byte();
        // The anchor of the last possible match sits here
        let last = haystack.len() - len + self.anchor;
        let mut from = self.anchor;
        while from <= last {
            let hit = memchr::memchr(anchor_byte, &haystack[from..=last])?;
            let start = from + hit - self.anchor;
            if self.matches(&haystack[start..start + len]) {
                return Some(start);
            }
            from += hit + 1;
        }
        None
    }
}

fn parse_token(token: &str) -> Option<Option<u8>> {
    if token == "??" {
        return Some(None);
    }
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(token, 16).ok().map(Some)
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (value, mask) in self.values.iter().zip(&self.masks) {
            for (byte, mask) in value.to_le_bytes().iter().zip(mask.to_le_bytes()) {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                if mask == 0 {
                    f.write_str("??")?;
                } else {
                    write!(f, "{:02X}", byte)?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}
