//! The storage contract behind the action dispatcher.

use serde_json::Value;

use crate::error::StoreError;
use crate::ledger::{MoveLog, Snapshot, SnapshotId};

/// Keyed ledger storage, one [`MoveLog`] per username.
///
/// Implementations must serialize the read-modify-write of a single
/// username's ledger: concurrent [`upsert`](Self::upsert),
/// [`clear`](Self::clear), and [`snapshot`](Self::snapshot) calls on the
/// same username never interleave. Distinct usernames are independent.
pub trait LogStore: Send + Sync {
    /// Return the ledger for `username`, creating and persisting an empty
    /// one if none exists. An existing ledger is never overwritten.
    fn ensure(&self, username: &str) -> Result<MoveLog, StoreError>;

    /// Record `value` under `key` in the ledger for `username`, creating
    /// the ledger if needed. The last writer wins for a given key.
    fn upsert(&self, username: &str, key: &str, value: Value) -> Result<(), StoreError>;

    /// Return the move stored under `key` for `username`.
    ///
    /// # Errors
    ///
    /// [`StoreError::LogNotFound`] if `username` has no ledger,
    /// [`StoreError::KeyNotFound`] if the ledger lacks `key`.
    fn lookup(&self, username: &str, key: &str) -> Result<Value, StoreError>;

    /// Delete the ledger for `username`. Succeeds whether or not it
    /// existed; returns `true` if something was removed.
    fn clear(&self, username: &str) -> Result<bool, StoreError>;

    /// Copy the live ledger for `username` into a new snapshot, leaving
    /// the live ledger untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::LogNotFound`] if `username` has no ledger.
    fn snapshot(&self, username: &str) -> Result<SnapshotId, StoreError>;

    /// Read back a previously stored snapshot.
    ///
    /// # Errors
    ///
    /// [`StoreError::SnapshotNotFound`] if nothing was stored under `id`.
    fn load_snapshot(&self, id: &SnapshotId) -> Result<Snapshot, StoreError>;
}
