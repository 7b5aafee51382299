use lnk_core::{CoreError, StorageError};
use thiserror::Error;

/// Type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad caller input. Surfaced as a rejection, never retried.
    #[error("invalid input parameter: {0}")]
    InvalidParameters(String),
    /// A clip for this uid is still being produced. The caller should
    /// retry later; this is an in-progress signal, not a failure.
    #[error("clip for uid '{0}' is still being produced")]
    StillProcessing(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        Self::InvalidParameters(err.to_string())
    }
}
