//! Error types for the hall collection.

use hallnav_protocol::DraftError;
use thiserror::Error;

/// Store operation result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Document does not exist
    #[error("Hall not found: {0}")]
    NotFound(String),

    /// Draft failed validation
    #[error("Invalid hall: {0}")]
    Invalid(#[from] DraftError),

    /// IO error (directory backend)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend task failed
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
