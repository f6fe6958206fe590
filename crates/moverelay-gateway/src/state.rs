//! Shared application state for the gateway.
//!
//! [`AppState`] carries the injected [`LogStore`] and the request body
//! limit. It is wrapped in [`Arc`] and handed to handlers through Axum's
//! `State` extractor.

use std::sync::Arc;

use moverelay_store::LogStore;

/// Default upper bound on an accepted request body, in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The move ledger store every request operates on.
    pub store: Arc<dyn LogStore>,
    /// Bodies larger than this are rejected as undecodable.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state around `store` with the default body limit.
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Override the request body limit.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}
