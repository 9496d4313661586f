use std::path::PathBuf;
use thiserror::Error;

/// Message surfaced when an appended code fails validation.
pub const INVALID_CODE_MESSAGE: &str = "Code must be 6–10 digits";

#[derive(Error, Debug)]
pub enum StorageError {
    /// User-facing storage failure (currently only code validation).
    #[error("{0}")]
    Storage(String),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{operation} requires the indexed consume mode")]
    Unsupported { operation: &'static str },
}

impl StorageError {
    pub fn invalid_code() -> Self {
        StorageError::Storage(INVALID_CODE_MESSAGE.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
