use std::fmt;

use strum::Display;
use thiserror::Error;

/// Which length-prefixed collection a length guard rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LengthKind {
    #[strum(serialize = "array")]
    Array,
    #[strum(serialize = "string")]
    String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Process access is not supported on this platform")]
    UnsupportedPlatform,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid signature pattern: {0}")]
    PatternSyntax(String),

    #[error("No memory region matched the pattern: {0}")]
    PatternNotFound(String),

    #[error("Invalid address expression at column {position}: {message}")]
    ExpressionSyntax { position: usize, message: String },

    #[error("Undefined variable: {0}")]
    UnknownVariable(String),

    #[error("Address {0} has not been resolved")]
    UnresolvedAddress(String),

    #[error("Variable {0} refers to itself")]
    RecursiveVariable(String),

    #[error("Read failed, {kind} length {length} < 0")]
    InvalidLength { kind: LengthKind, length: i32 },

    #[error("Read failed, {kind} too long ({length} > {max})")]
    TooLong {
        kind: LengthKind,
        length: i32,
        max: i32,
    },

    #[error("Field {field} cannot hold a value decoded as {shape}")]
    ShapeMismatch { field: String, shape: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read_failed(address: u64, message: impl Into<String>) -> Self {
        Error::MemoryReadFailed {
            address,
            message: message.into(),
        }
    }

    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::ExpressionSyntax {
            position,
            message: message.into(),
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if this error came from a failed memory read rather than bad input.
    ///
    /// Broken pointer chains surface as read failures or as garbage length
    /// prefixes, both of which are expected while the game switches screens.
    pub fn is_memory_fault(&self) -> bool {
        matches!(
            self,
            Error::MemoryReadFailed { .. } | Error::InvalidLength { .. } | Error::TooLong { .. }
        )
    }
}

/// A single field that could not be populated during a record read.
#[derive(Debug)]
pub struct FieldError {
    pub field: &'static str,
    pub source: Error,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.source)
    }
}

/// Every field failure from one record read, in field declaration order.
#[derive(Debug, Error)]
pub struct AggregateError {
    record: &'static str,
    failures: Vec<FieldError>,
}

impl AggregateError {
    pub fn new(record: &'static str, failures: Vec<FieldError>) -> Self {
        Self { record, failures }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn failures(&self) -> &[FieldError] {
        &self.failures
    }

    /// Names of the failing fields
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.failures.iter().map(|f| f.field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.failures.iter().any(|f| f.field == field)
    }

    /// True when every failing field is one of `fields`.
    ///
    /// Callers use this to ignore pointers that are legitimately null outside
    /// of gameplay.
    pub fn only_within<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        self.failures
            .iter()
            .all(|f| fields.iter().any(|name| name.as_ref() == f.field))
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read {}: ", self.record)?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate() -> AggregateError {
        AggregateError::new(
            "GameplayData",
            vec![
                FieldError {
                    field: "leaderboard",
                    source: Error::read_failed(0x24, "no bytes read"),
                },
                FieldError {
                    field: "key_overlay",
                    source: Error::UnknownVariable("Missing".to_string()),
                },
            ],
        )
    }

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_length_error_messages() {
        let err = Error::InvalidLength {
            kind: LengthKind::String,
            length: -1,
        };
        assert_eq!(err.to_string(), "Read failed, string length -1 < 0");

        let err = Error::TooLong {
            kind: LengthKind::Array,
            length: 70000,
            max: 65536,
        };
        assert_eq!(err.to_string(), "Read failed, array too long (70000 > 65536)");
        assert!(err.is_memory_fault());
    }

    #[test]
    fn test_aggregate_names_fields() {
        let err = aggregate();
        assert_eq!(err.len(), 2);
        assert!(err.contains("leaderboard"));
        assert!(!err.contains("hit_miss"));
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["leaderboard", "key_overlay"]
        );
        assert!(
            err.to_string()
                .starts_with("failed to read GameplayData: leaderboard: ")
        );
    }

    #[test]
    fn test_aggregate_only_within() {
        let err = aggregate();
        assert!(err.only_within(&["leaderboard", "key_overlay", "combo"]));
        assert!(!err.only_within(&["leaderboard"]));
    }
}
