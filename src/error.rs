//! Centralized error types for mailnorm.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailnorm library.
///
/// Only [`MailError::Framing`] is ever produced while normalizing a message;
/// charset, transfer-encoding and multipart problems are recovered in place.
#[derive(Error, Debug)]
pub enum MailError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input file does not exist.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// The message cannot be parsed as a MIME entity at all.
    #[error("Framing error at offset {offset}: {reason}")]
    Framing { offset: u64, reason: String },

    /// The configuration file could not be used.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Framing` variant for the message starting at `offset`.
    pub fn framing(offset: u64, reason: impl Into<String>) -> Self {
        Self::Framing {
            offset,
            reason: reason.into(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (stdin, mostly; prefer `MailError::io`).
impl From<std::io::Error> for MailError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<stdin>"),
            source,
        }
    }
}
