use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Length of generated uids.
pub const DEFAULT_UID_LEN: usize = 8;

/// Uids that collide with fixed route prefixes and must never be
/// accepted from a caller.
pub const RESERVED_UIDS: [&str; 2] = ["health", "static"];

const UID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A short identifier naming a link record.
///
/// The target URL it maps to is treated as an opaque string; the uid is
/// the only validated part of a link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(String);

impl Uid {
    /// Creates a `Uid` from caller input, rejecting empty strings and
    /// the reserved route keywords.
    pub fn new(uid: impl Into<String>) -> Result<Self, CoreError> {
        let uid = uid.into();
        if uid.is_empty() {
            return Err(CoreError::EmptyUid);
        }
        if RESERVED_UIDS.contains(&uid.as_str()) {
            return Err(CoreError::ReservedUid(uid));
        }
        Ok(Self(uid))
    }

    /// Creates a `Uid` without validation.
    ///
    /// Use this only for uids produced by trusted internal sources.
    pub fn new_unchecked(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Generates a random alphanumeric uid of [`DEFAULT_UID_LEN`] characters.
    pub fn generate() -> Self {
        Self::generate_with_len(DEFAULT_UID_LEN)
    }

    /// Generates a random alphanumeric uid of the given length.
    pub fn generate_with_len(length: usize) -> Self {
        let uid: String =
            std::iter::repeat_with(|| UID_CHARS[rand::random_range(0..UID_CHARS.len())] as char)
                .take(length)
                .collect();
        Self(uid)
    }

    /// Returns the uid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}
