//! Error types for Atlas

use thiserror::Error;

/// Errors raised by a record store
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;
