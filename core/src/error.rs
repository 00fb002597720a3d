//! Error types for LANDREG

use thiserror::Error;

/// Main error type for LANDREG
#[derive(Error, Debug)]
pub enum RegistryError {
    // ============ Ledger Errors ============
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Read conflict on key {key}: value changed before commit")]
    MvccConflict { key: String },

    // ============ Encoding Errors ============
    #[error("Malformed ledger value: {0}")]
    Decode(String),

    // ============ Invocation Errors ============
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RegistryError {
    /// Wrap a storage-layer failure with the operation that hit it
    pub fn persistence(context: &str, err: impl std::fmt::Display) -> Self {
        RegistryError::Persistence(format!("{}: {}", context, err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Decode(err.to_string())
    }
}
