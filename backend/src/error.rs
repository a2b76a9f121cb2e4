use thiserror::Error;

/// Errors raised by the matching core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    /// A required profile or argument was missing.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A record that does not fit the current user; skipped, never fatal.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}
