//! Error types for lineage-cli

use thiserror::Error;

/// Result type alias for lineage-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lineage-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the engine crates
    #[error("{0}")]
    Core(#[from] lineage::Error),

    /// No project on the command line or in the config
    #[error("no project selected; pass --project or set default_project in the config")]
    MissingProject,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(lineage::Error::from(err))
    }
}
