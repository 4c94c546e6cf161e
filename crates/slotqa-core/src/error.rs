//! Error types for slotqa-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Checklist item not found: {category}/{item}")]
    ItemNotFound { category: String, item: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid package catalog: {0}")]
    Catalog(String),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl Error {
    /// True for the package/category/item lookup failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PackageNotFound(_) | Error::CategoryNotFound(_) | Error::ItemNotFound { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
