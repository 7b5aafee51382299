use thiserror::Error;

/// Errors for input handling in the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid ttl value: {0}")]
    InvalidTtl(String),
    #[error("invalid boolean value: {0}")]
    InvalidBool(String),
    #[error("uid '{0}' is reserved")]
    ReservedUid(String),
    #[error("uid must not be empty")]
    EmptyUid,
}

/// Errors from the value codec.
///
/// A decode failure means the bytes in the backend do not round-trip,
/// i.e. the stored value is corrupt. Callers must surface it, not
/// swallow it.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(String),
    #[error("failed to decode stored bytes: {0}")]
    Decode(String),
}

/// Errors from the storage backends.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage initialization failed: {0}")]
    Initialization(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("corrupt value in storage: {0}")]
    Codec(#[from] CodecError),
    #[error("storage operation failed: {0}")]
    Operation(String),
}
