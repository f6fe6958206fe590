//! Axum router construction for the gateway.
//!
//! The relay has one endpoint and does not route by path: every request
//! falls through to [`handlers::relay`], which applies its own method
//! and content-type checks. No middleware may answer a request on its
//! own, so even an `OPTIONS` preflight gets the JSON `BadMethod` reply.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the relay.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handlers::relay)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
