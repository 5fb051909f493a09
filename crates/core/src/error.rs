//! Error types for export-table loading and binary parsing.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The trusted export definition (or the checker's own configuration) could
/// not be used. Fatal for the whole run: no binary is checked.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry moved or was renamed; refusing to continue with a partial
    /// or empty table.
    #[error("failed to locate `{marker}` in {}", path.display())]
    MissingMarker { path: PathBuf, marker: &'static str },

    #[error("malformed export manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("malformed checker config {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },

    #[error("invalid checker setting `{setting}`: {message}")]
    Invalid { setting: &'static str, message: String },
}

/// A candidate binary's structure could not be decoded. Local to that binary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("cannot read file: {0}")]
    Io(String),

    #[error("malformed ELF: {0}")]
    Elf(String),

    #[error("parsing did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("cannot start parser worker: {0}")]
    Spawn(String),

    #[error("parser worker exited without a result")]
    WorkerLost,
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io(err.to_string())
    }
}

impl From<goblin::error::Error> for ParseError {
    fn from(err: goblin::error::Error) -> Self {
        ParseError::Elf(err.to_string())
    }
}
