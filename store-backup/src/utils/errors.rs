//! Error types for the backup engine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backup blob is not a valid compressed envelope. Fatal to an upload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A single file or directory operation failed. Logged and skipped.
    #[error("Directory I/O error at {}: {source}", .path.display())]
    DirectoryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A malformed entry inside the template tree archive. Logged and skipped.
    #[error("Archive format error: {0}")]
    ArchiveFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl BackupError {
    pub(crate) fn directory_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
