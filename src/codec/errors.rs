//! # Codec Errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors decoding a compact filter string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input is not JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A filter entry is not a positional array
    #[error("Expected an array at {0}")]
    ExpectedArray(String),

    /// A simple filter has a malformed field path
    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),

    /// A simple filter is missing its operator
    #[error("Missing operator at {0}")]
    MissingOperator(String),

    /// A root or compound keyword is neither "and" nor "or"
    #[error("Unknown connective: {0}")]
    UnknownConnective(String),
}
