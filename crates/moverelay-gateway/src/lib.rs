//! Request gateway for the move relay.
//!
//! This crate turns HTTP requests into ledger operations:
//!
//! - **Gateway** ([`handlers::relay`]) -- enforces the `POST` +
//!   `application/json` preconditions, reads the whole body, decodes it,
//!   and renders every outcome (including failures) as JSON
//! - **Dispatcher** ([`dispatch::dispatch`]) -- maps the decoded
//!   `{action, ...}` object onto a [`LogStore`] operation
//! - **Server** ([`server::start_server`]) -- binds the listener and
//!   serves until shutdown
//!
//! # Architecture
//!
//! There is a single endpoint: the router sends every path to the
//! gateway handler. The store is synchronous, so the dispatcher runs on
//! Tokio's blocking pool; per-username serialization is the store's job.
//!
//! [`LogStore`]: moverelay_store::LogStore

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, RelayConfig};
pub use dispatch::{dispatch, Action, Reply};
pub use error::{RelayError, Rejection, RequestEcho};
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
