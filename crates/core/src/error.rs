//! Error types for osync-core
//!
//! Provides a unified error type. Folder operations that stop early keep the
//! outcomes gathered so far attached to the error.

use std::path::PathBuf;

use thiserror::Error;

use crate::transfer::TransferReport;

/// Result type alias for osync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for osync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing bucket, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid key, prefix or local path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The store failed to return a listing page
    #[error("Listing failed: {0}")]
    Listing(String),

    /// A single get/put/copy/write failed
    #[error("Transfer of '{key}' failed: {message}")]
    Transfer { key: String, message: String },

    /// A local directory could not be created
    #[error("Failed to create directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more tasks in a batch failed
    #[error(
        "{} of {} transfer(s) failed",
        .0.failed().count(),
        .0.outcomes.len()
    )]
    PartialTransfer(Box<TransferReport>),

    /// The operation was cancelled or its deadline expired
    #[error("Operation cancelled")]
    Cancelled,

    /// A folder operation stopped early after some tasks had settled
    #[error("{cause}")]
    Interrupted {
        cause: Box<Error>,
        report: Box<TransferReport>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// The per-task report of a partially failed or interrupted operation
    pub fn report(&self) -> Option<&TransferReport> {
        match self {
            Error::PartialTransfer(report) | Error::Interrupted { report, .. } => Some(&**report),
            _ => None,
        }
    }

    /// The error that stopped the operation, looking through [`Error::Interrupted`]
    pub fn root(&self) -> &Error {
        match self {
            Error::Interrupted { cause, .. } => cause.root(),
            other => other,
        }
    }

    /// Attach the outcomes gathered before a listing failure or cancellation
    ///
    /// Nothing is attached when no task has settled yet.
    pub(crate) fn with_report(self, report: TransferReport) -> Self {
        if report.visited() == 0 {
            return self;
        }
        Error::Interrupted {
            cause: Box::new(self),
            report: Box::new(report),
        }
    }

    pub(crate) fn transfer(key: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Error::Transfer {
            key: key.into(),
            message: source.to_string(),
        }
    }
}
