//! Ledger and snapshot value types.
//!
//! A [`MoveLog`] serializes as a plain JSON object (`{"<key>": <move>}`),
//! which is exactly what the file backend writes to disk. Moves are
//! opaque [`serde_json::Value`]s; the store never looks inside them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

/// Format used for the timestamp half of a [`SnapshotId`].
const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

/// The key→move ledger for one username.
///
/// Keys are unique and iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveLog {
    entries: BTreeMap<String, Value>,
}

impl MoveLog {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Return the move recorded under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Record `value` under `key`, returning the move it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Whether a move is recorded under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of recorded moves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no moves.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, move)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for MoveLog {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Identifier of a saved ledger copy.
///
/// Derived from the save time and the ledger owner. The UUID v7 nonce
/// keeps two saves of the same user within one millisecond apart.
///
/// The rendered form (`YYYYMMDDTHHMMSS.mmmZ-<nonce>`) leaves out the
/// owner, so reading it back with [`SnapshotId::parse`] needs the
/// username it was saved for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Owner of the copied ledger.
    pub username: String,
    /// Time-ordered disambiguator.
    pub nonce: Uuid,
}

impl SnapshotId {
    /// Allocate a fresh identifier for a snapshot of `username` taken now.
    pub fn new(username: &str) -> Self {
        Self {
            // Millisecond precision, matching the rendered form.
            taken_at: Utc::now().trunc_subsecs(3),
            username: username.to_owned(),
            nonce: Uuid::now_v7(),
        }
    }

    /// Rebuild the identifier `text` was rendered from for `username`'s
    /// snapshot, as returned by a `save`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSnapshotId`] unless `text` is exactly
    /// the rendered form of an identifier.
    pub fn parse(username: &str, text: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidSnapshotId(text.to_owned());
        let (stamp, nonce) = text.split_once('-').ok_or_else(invalid)?;
        let taken_at = NaiveDateTime::parse_from_str(stamp, SNAPSHOT_TIMESTAMP_FORMAT)
            .map_err(|e| {
                tracing::debug!(text, error = %e, "Bad snapshot timestamp");
                invalid()
            })?
            .and_utc();
        let nonce = Uuid::try_parse(nonce).map_err(|e| {
            tracing::debug!(text, error = %e, "Bad snapshot nonce");
            invalid()
        })?;

        let id = Self {
            taken_at,
            username: username.to_owned(),
            nonce,
        };
        // Only the canonical rendering names a snapshot.
        if id.to_string() == text {
            Ok(id)
        } else {
            Err(invalid())
        }
    }
}

impl core::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.taken_at.format(SNAPSHOT_TIMESTAMP_FORMAT),
            self.nonce.simple()
        )
    }
}

/// An immutable copy of a ledger taken at `save` time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identifier the snapshot was stored under.
    pub id: SnapshotId,
    /// The ledger contents at save time.
    pub ledger: MoveLog,
}
