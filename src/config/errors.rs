//! # Configuration Errors

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Config file error at {path}: {message}")]
    Io { path: String, message: String },

    /// Config text is not valid JSON for a dashboard config
    #[error("Invalid config: {0}")]
    InvalidJson(String),

    /// A field path does not name a known field
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

impl ConfigError {
    pub(crate) fn io(path: &std::path::Path, error: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::InvalidJson(error.to_string())
    }
}
