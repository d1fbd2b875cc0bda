//! Admin moderation views.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::content::{ContentError, StatusCounts};
use crate::error::AppResult;
use crate::models::{ContentItem, ContentStatus};
use crate::permissions::Subject;
use crate::state::AppState;

/// Query for `/api/admin/content`.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Query for `/api/admin/reviewed`.
#[derive(Debug, Deserialize)]
pub struct ReviewedQuery {
    pub decision: Option<String>,
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/content", get(list_by_status))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/reviewed", get(reviewed))
}

/// Parse an optional status parameter, falling back to `default`.
fn parse_status(
    raw: Option<&str>,
    field: &str,
    default: ContentStatus,
) -> Result<ContentStatus, ContentError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|e: anyhow::Error| ContentError::schema(field, e.to_string())),
    }
}

async fn list_by_status(
    State(state): State<AppState>,
    subject: Subject,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Vec<ContentItem>>> {
    let status = parse_status(query.status.as_deref(), "status", ContentStatus::Pending)?;
    Ok(Json(state.content().list_by_status(&subject, status).await?))
}

async fn stats(State(state): State<AppState>, subject: Subject) -> AppResult<Json<StatusCounts>> {
    Ok(Json(state.content().moderation_stats(&subject).await?))
}

async fn reviewed(
    State(state): State<AppState>,
    subject: Subject,
    Query(query): Query<ReviewedQuery>,
) -> AppResult<Json<Vec<ContentItem>>> {
    let decision = parse_status(
        query.decision.as_deref(),
        "decision",
        ContentStatus::Approved,
    )?;
    Ok(Json(
        state.content().list_reviewed_by(&subject, decision).await?,
    ))
}
