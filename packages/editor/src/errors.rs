//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Clone error: {0}")]
    Clone(#[from] crate::clone::CloneError),

    #[error("Operation error: {0}")]
    Operation(#[from] crate::operations::OperationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
