//! Benchmark error types.

use thiserror::Error;

/// Errors raised while generating, serializing or loading a batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The store could not be reached or the connection dropped.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Serialized data does not match what the loader expects.
    #[error("format error: {0}")]
    Format(String),

    /// A single statement failed.
    #[error("execution error: {0}")]
    Execution(String),

    /// Invalid configuration (bad identifier, local infile disabled, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error writing or reading the intermediate artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Execution(err.to_string())
    }
}
