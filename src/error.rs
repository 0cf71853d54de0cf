//! Error types for the mode core.

use thiserror::Error;

/// Result type alias for scanning and tokenizing operations.
pub type Result<T> = std::result::Result<T, ModeError>;

/// Failures raised while driving a mode over text.
///
/// Unknown mode names are deliberately absent: the registry degrades them
/// to the `null` mode instead of failing.
#[derive(Error, Debug)]
pub enum ModeError {
    #[error("mode `{mode}` did not advance at line {line}, column {column}")]
    NonProgress {
        mode: String,
        line: usize,
        column: usize,
    },

    #[error("malformed pattern: {0}")]
    MalformedPattern(#[from] regex::Error),

    #[error("state handed to mode `{0}` belongs to a different mode")]
    StateMismatch(String),

    #[error("grammar failed to parse line: {0}")]
    Parse(#[from] syntect::parsing::ParsingError),

    #[error("scope stack corrupted: {0}")]
    Scope(#[from] syntect::parsing::ScopeError),
}
