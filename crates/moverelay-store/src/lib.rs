//! Move ledger storage for the move relay.
//!
//! Every username owns at most one live [`MoveLog`]: an ordered mapping
//! from caller-supplied turn keys to opaque JSON moves. The ledger is
//! persisted and replaced as a single unit, so every mutation is a full
//! read-modify-write. Implementations of [`LogStore`] serialize those
//! read-modify-write cycles per username.
//!
//! # Backends
//!
//! - [`FileLogStore`] -- one JSON file per username plus a directory of
//!   snapshot copies, written via temp file + atomic rename
//! - [`MemoryLogStore`] -- lock-guarded maps for tests and ephemeral runs
//!
//! # Modules
//!
//! - [`ledger`] -- [`MoveLog`], [`Snapshot`], and [`SnapshotId`]
//! - [`store`] -- the [`LogStore`] trait
//! - [`file`] -- file-backed store and username path encoding
//! - [`memory`] -- in-memory store
//! - [`locks`] -- per-username mutex registry
//! - [`error`] -- shared error types

pub mod error;
pub mod file;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use file::FileLogStore;
pub use ledger::{MoveLog, Snapshot, SnapshotId};
pub use locks::UserLocks;
pub use memory::MemoryLogStore;
pub use store::LogStore;
