//! Error types for lineage-core

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for lineage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Lineage engine.
///
/// Absence conditions (no parent, no history, unknown version) are not
/// errors; only the storage layer, I/O and configuration can fail.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A key-value backend failed to read or write a key.
    #[error("Storage error for key '{key}': {message}")]
    Storage {
        /// Store key being accessed
        key: String,
        /// What went wrong
        message: String,
    },

    /// I/O error, optionally tied to a path.
    #[error("I/O error{}: {source}", path_suffix(.path))]
    Io {
        /// Underlying error
        #[source]
        source: std::io::Error,
        /// Path involved, if known
        path: Option<PathBuf>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A requested entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (e.g. "version", "project")
        kind: String,
        /// Identifier that was looked up
        id: String,
    },
}

impl Error {
    /// Creates a storage error for the given key.
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            source,
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Returns whether this error came from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. } | Error::Io { .. })
    }
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source, path: None }
    }
}
