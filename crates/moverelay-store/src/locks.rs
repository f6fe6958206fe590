//! Per-username mutual exclusion.
//!
//! [`UserLocks`] hands out one mutex per username so that ledger
//! read-modify-write cycles on the same user run one at a time while
//! different users proceed in parallel. Slots nobody holds are pruned
//! the next time a slot is requested.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Registry of per-username mutexes.
#[derive(Debug, Default)]
pub struct UserLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the mutex for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if the registry or the user's
    /// mutex was poisoned, otherwise whatever `f` returns.
    pub fn with_lock<T>(
        &self,
        username: &str,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let slot = self.slot(username)?;
        let _guard = slot.lock()?;
        f()
    }

    /// Number of usernames currently tracked.
    pub fn tracked(&self) -> Result<usize, StoreError> {
        Ok(self.slots.lock()?.len())
    }

    fn slot(&self, username: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut slots = self.slots.lock()?;
        // A count of one means only the registry references the slot, and
        // new holders must pass through this (locked) map to obtain it.
        slots.retain(|name, slot| name == username || Arc::strong_count(slot) > 1);
        let slot = slots
            .entry(username.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Ok(Arc::clone(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn idle_slots_are_pruned() {
        let locks = UserLocks::new();
        locks.with_lock("alice", || Ok(())).unwrap();
        locks.with_lock("bob", || Ok(())).unwrap();
        // Requesting "carol" prunes both idle slots.
        locks.with_lock("carol", || Ok(())).unwrap();
        assert_eq!(locks.tracked().unwrap(), 1);
    }

    #[test]
    fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks
                        .with_lock("alice", || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(5));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_from_closure_is_returned() {
        let locks = UserLocks::new();
        let result: Result<(), StoreError> =
            locks.with_lock("alice", || Err(StoreError::log_not_found("alice")));
        assert!(matches!(result, Err(StoreError::LogNotFound { .. })));
    }
}
