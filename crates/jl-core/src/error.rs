//! Error types for jl-core

use thiserror::Error;

/// Core error type for Joinlab
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Catalog markdown file not found
    #[error("[E004] Catalog not found: {path}")]
    CatalogNotFound { path: String },

    /// E005: Unknown catalog entry requested by id
    #[error("[E005] Unknown catalog entry '{id}'. Known entries: {known}")]
    UnknownEntry { id: String, known: String },

    /// E006: Unknown relation name
    #[error("[E006] Unknown relation: {name}")]
    UnknownRelation { name: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
