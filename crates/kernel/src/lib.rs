//! Lectern kernel library.
//!
//! Content lifecycle and moderation engine for contributor-authored lessons,
//! plus the HTTP boundary that serves it. The `lectern` binary wires these
//! together; integration tests drive [`app`] directly.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with its request middleware.
///
/// Layers (last added = first executed in request flow):
/// TraceLayer → request metrics → bearer auth → routes
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate_bearer_token,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
