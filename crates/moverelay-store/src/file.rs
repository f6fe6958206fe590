//! File-backed [`LogStore`] implementation.
//!
//! # Layout
//!
//! ```text
//! <ledger_dir>/move-log-<user>.json            live ledger, JSON object
//! <snapshot_dir>/<user>/<snapshot id>.json      saved copies
//! ```
//!
//! `<user>` is the username passed through [`encode_username`], so every
//! username maps to a single path component of bounded length inside the
//! configured directories. Writes go to a `.tmp` sibling first and are renamed (or,
//! for first creation, hard-linked) into place, so readers never observe
//! a half-written ledger.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::ledger::{MoveLog, Snapshot, SnapshotId};
use crate::locks::UserLocks;
use crate::store::LogStore;

/// Stores each user's ledger as a JSON file.
#[derive(Debug)]
pub struct FileLogStore {
    ledger_dir: PathBuf,
    snapshot_dir: PathBuf,
    locks: UserLocks,
}

impl FileLogStore {
    /// Open a store rooted at the given directories, creating them if
    /// they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if a directory cannot be created.
    pub fn open(
        ledger_dir: impl AsRef<Path>,
        snapshot_dir: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let ledger_dir = ledger_dir.as_ref().to_path_buf();
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&ledger_dir)?;
        fs::create_dir_all(&snapshot_dir)?;

        tracing::debug!(
            ledger_dir = %ledger_dir.display(),
            snapshot_dir = %snapshot_dir.display(),
            "Opened file log store"
        );

        Ok(Self {
            ledger_dir,
            snapshot_dir,
            locks: UserLocks::new(),
        })
    }

    /// Directory holding the live ledgers.
    pub fn ledger_dir(&self) -> &Path {
        &self.ledger_dir
    }

    /// Directory holding the per-user snapshot directories.
    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Path of the live ledger file for `username`.
    pub fn ledger_path(&self, username: &str) -> PathBuf {
        self.ledger_dir
            .join(format!("move-log-{}.json", encode_username(username)))
    }

    /// Path of the file a snapshot is stored in.
    pub fn snapshot_path(&self, id: &SnapshotId) -> PathBuf {
        self.snapshot_dir
            .join(encode_username(&id.username))
            .join(format!("{id}.json"))
    }

    /// Publish an empty ledger at `path` without clobbering one that
    /// appeared in the meantime: the temp file is hard-linked into place,
    /// which fails if the target exists.
    fn create_empty(path: &Path) -> Result<MoveLog, StoreError> {
        let ledger = MoveLog::new();
        let temp = temp_path(path);
        fs::write(&temp, serde_json::to_vec(&ledger)?)?;
        let linked = fs::hard_link(&temp, path);
        fs::remove_file(&temp)?;
        match linked {
            Ok(()) => Ok(ledger),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                read_json(path)?.ok_or_else(|| StoreError::Io(e))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl LogStore for FileLogStore {
    fn ensure(&self, username: &str) -> Result<MoveLog, StoreError> {
        let path = self.ledger_path(username);
        self.locks.with_lock(username, || {
            if let Some(ledger) = read_json::<MoveLog>(&path)? {
                return Ok(ledger);
            }
            let ledger = Self::create_empty(&path)?;
            tracing::debug!(username, "Created empty move log");
            Ok(ledger)
        })
    }

    fn upsert(&self, username: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.ledger_path(username);
        self.locks.with_lock(username, || {
            let mut ledger: MoveLog = read_json(&path)?.unwrap_or_default();
            let replaced = ledger.insert(key, value).is_some();
            write_atomic(&path, &serde_json::to_vec(&ledger)?)?;
            tracing::debug!(username, key, replaced, moves = ledger.len(), "Recorded move");
            Ok(())
        })
    }

    fn lookup(&self, username: &str, key: &str) -> Result<Value, StoreError> {
        let ledger: MoveLog = read_json(&self.ledger_path(username))?
            .ok_or_else(|| StoreError::log_not_found(username))?;
        ledger
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::key_not_found(username, key))
    }

    fn clear(&self, username: &str) -> Result<bool, StoreError> {
        let path = self.ledger_path(username);
        self.locks.with_lock(username, || match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(username, "Cleared move log");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        })
    }

    fn snapshot(&self, username: &str) -> Result<SnapshotId, StoreError> {
        let path = self.ledger_path(username);
        self.locks.with_lock(username, || {
            let ledger: MoveLog =
                read_json(&path)?.ok_or_else(|| StoreError::log_not_found(username))?;

            let snapshot = Snapshot {
                id: SnapshotId::new(username),
                ledger,
            };
            let target = self.snapshot_path(&snapshot.id);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(&target, &serde_json::to_vec_pretty(&snapshot)?)?;

            tracing::debug!(
                username,
                snapshot = %snapshot.id,
                moves = snapshot.ledger.len(),
                "Saved move log snapshot"
            );
            Ok(snapshot.id)
        })
    }

    fn load_snapshot(&self, id: &SnapshotId) -> Result<Snapshot, StoreError> {
        read_json(&self.snapshot_path(id))?
            .ok_or_else(|| StoreError::SnapshotNotFound(id.to_string()))
    }
}

/// Longest encoded username used verbatim. Keeps every file name the
/// store creates well under the common 255-byte limit.
pub const MAX_ENCODED_USERNAME: usize = 200;

/// Length of the readable prefix kept in front of a username digest.
const DIGEST_PREFIX_LEN: usize = 32;

/// Namespace for the name-based UUIDs of over-long usernames.
const USERNAME_NAMESPACE: Uuid = Uuid::from_u128(0x6d6f_7665_7265_6c61_7975_7365_726e_616d);

/// Encode a username as a single safe path component.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte is
/// written as `%XX` with uppercase hex digits. If that encoding is longer
/// than [`MAX_ENCODED_USERNAME`], the result is its first few characters
/// followed by `~` and a UUID v5 of the full username. A plain encoding
/// never contains `~` (it is escaped as `%7E`), so the two forms cannot
/// collide.
pub fn encode_username(username: &str) -> String {
    let mut out = String::with_capacity(username.len());
    for byte in username.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "%{byte:02X}");
        }
    }

    if out.len() > MAX_ENCODED_USERNAME {
        out.truncate(DIGEST_PREFIX_LEN);
        // Drop a trailing escape cut in half.
        if let Some(cut) = out
            .rfind('%')
            .filter(|&at| out.len().saturating_sub(at) < 3)
        {
            out.truncate(cut);
        }
        let digest = Uuid::new_v5(&USERNAME_NAMESPACE, username.as_bytes());
        let _ = write!(out, "~{}", digest.simple());
    }
    out
}

/// Read and decode a JSON file, mapping a missing file to `None`.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `bytes` to a temp sibling of `path`, then rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_path(path);
    fs::write(&temp, bytes)?;
    fs::rename(&temp, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}
