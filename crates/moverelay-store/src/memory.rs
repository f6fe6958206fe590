//! In-memory [`LogStore`] implementation for tests and ephemeral runs.
//!
//! Every operation runs under a single lock, which trivially satisfies
//! the per-username serialization contract.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::StoreError;
use crate::ledger::{MoveLog, Snapshot, SnapshotId};
use crate::store::LogStore;

/// Keeps ledgers and snapshots in process memory.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    ledgers: RwLock<HashMap<String, MoveLog>>,
    snapshots: RwLock<HashMap<SnapshotId, MoveLog>>,
}

impl MemoryLogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live ledgers.
    pub fn ledger_count(&self) -> Result<usize, StoreError> {
        Ok(self.ledgers.read()?.len())
    }
}

impl LogStore for MemoryLogStore {
    fn ensure(&self, username: &str) -> Result<MoveLog, StoreError> {
        let mut ledgers = self.ledgers.write()?;
        Ok(ledgers.entry(username.to_owned()).or_default().clone())
    }

    fn upsert(&self, username: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut ledgers = self.ledgers.write()?;
        ledgers
            .entry(username.to_owned())
            .or_default()
            .insert(key, value);
        tracing::debug!(username, key, "Recorded move");
        Ok(())
    }

    fn lookup(&self, username: &str, key: &str) -> Result<Value, StoreError> {
        let ledgers = self.ledgers.read()?;
        let ledger = ledgers
            .get(username)
            .ok_or_else(|| StoreError::log_not_found(username))?;
        ledger
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::key_not_found(username, key))
    }

    fn clear(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.ledgers.write()?.remove(username).is_some())
    }

    fn snapshot(&self, username: &str) -> Result<SnapshotId, StoreError> {
        // Hold the ledger write lock so no upsert lands mid-copy.
        let ledgers = self.ledgers.write()?;
        let ledger = ledgers
            .get(username)
            .ok_or_else(|| StoreError::log_not_found(username))?
            .clone();
        let id = SnapshotId::new(username);
        self.snapshots.write()?.insert(id.clone(), ledger);
        tracing::debug!(username, snapshot = %id, "Saved move log snapshot");
        Ok(id)
    }

    fn load_snapshot(&self, id: &SnapshotId) -> Result<Snapshot, StoreError> {
        let snapshots = self.snapshots.read()?;
        let ledger = snapshots
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::SnapshotNotFound(id.to_string()))?;
        Ok(Snapshot {
            id: id.clone(),
            ledger,
        })
    }
}
