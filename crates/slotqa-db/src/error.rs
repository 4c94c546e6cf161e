//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error. The write, if any, was not committed.
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Bad credentials or unknown session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A stored row failed to decode. The request itself was fine.
    #[error("Corrupt stored row: {0}")]
    CorruptRow(String),

    /// Domain error (unknown package, category or item; invalid input).
    #[error(transparent)]
    Core(#[from] slotqa_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn corrupt(err: slotqa_core::Error) -> Self {
        Error::CorruptRow(err.to_string())
    }

    /// True for missing records and for core lookup failures
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Core(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;
