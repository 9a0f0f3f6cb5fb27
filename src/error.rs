// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure modes of the emissions pipeline.
///
/// Only [`Error::NotFound`] is recovered in-process (the locator falls back
/// to a configured URL); every other variant ends the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no dataset link found at {page}: {reason}")]
    NotFound { page: String, reason: String },

    #[error("transfer of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bad archive: {0}")]
    ArchiveFormat(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("writing {path:?} failed: {message}")]
    Io { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::NotFound { .. } | Error::Transfer { .. } => 1,
            Error::ArchiveFormat(_) | Error::Schema(_) => 2,
            Error::Io { .. } => 3,
            Error::Config(_) => 4,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::ArchiveFormat(e.to_string())
    }
}
