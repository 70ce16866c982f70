//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be loaded, saved or resolved
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Query string could not be decoded
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// A decoded filter names an unknown datastore, database, table or field
    #[error("Unknown data source in filter: {0}")]
    UnresolvedFilter(String),

    /// stdout failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "DASHFILTER_CLI_CONFIG_ERROR",
            Self::Codec(_) => "DASHFILTER_CLI_QUERY_ERROR",
            Self::UnresolvedFilter(_) => "DASHFILTER_CLI_UNKNOWN_FIELD",
            Self::Io(_) | Self::Json(_) => "DASHFILTER_CLI_IO_ERROR",
        }
    }
}
