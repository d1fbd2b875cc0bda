//! HTTP route handlers.

pub mod admin;
pub mod catalog;
pub mod content;
pub mod health;
pub mod metrics;

use axum::Router;

use crate::state::AppState;

/// All API routes, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(content::router())
        .merge(admin::router())
        .merge(catalog::router())
        .merge(health::router())
        .merge(metrics::router())
}
