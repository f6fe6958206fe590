//! Error types for the move ledger store.
//!
//! [`StoreError`] separates the two lookup misses callers react to
//! ([`StoreError::LogNotFound`] and [`StoreError::KeyNotFound`]) from the
//! storage failures they can only report.

/// Errors that can occur in a [`LogStore`](crate::LogStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No live ledger exists for the username.
    #[error("no move log found for '{username}'")]
    LogNotFound {
        /// The username that was looked up.
        username: String,
    },

    /// The ledger exists but holds no move under the key.
    #[error("no move with key '{key}' found for '{username}'")]
    KeyNotFound {
        /// The ledger owner.
        username: String,
        /// The missing turn key.
        key: String,
    },

    /// No snapshot was stored under the identifier.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Text that is not a rendered [`SnapshotId`](crate::SnapshotId).
    #[error("invalid snapshot id: '{0}'")]
    InvalidSnapshotId(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A ledger or snapshot could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock guarding store state was poisoned by a panicking holder.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Build a [`StoreError::LogNotFound`] for `username`.
    pub fn log_not_found(username: &str) -> Self {
        Self::LogNotFound {
            username: username.to_owned(),
        }
    }

    /// Build a [`StoreError::KeyNotFound`] for `username` and `key`.
    pub fn key_not_found(username: &str, key: &str) -> Self {
        Self::KeyNotFound {
            username: username.to_owned(),
            key: key.to_owned(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
