//! Contributor and moderation endpoints for content items.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::content::{ContentInput, ModerationReceipt, RejectRequest};
use crate::error::{AppError, AppResult};
use crate::models::{ContentItem, ContentStatus};
use crate::permissions::Subject;
use crate::state::AppState;

/// Update payload: the content fields plus the submit flag.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub content: ContentInput,
    pub submit: bool,
}

/// Create the content router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/content/draft", post(create_draft))
        .route("/api/content/submit", post(create_and_submit))
        .route("/api/content/my-submissions", get(my_submissions))
        .route("/api/content/approved", get(approved))
        .route("/api/content/pending", get(pending))
        .route(
            "/api/content/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/api/content/{id}/approve", put(approve_content))
        .route("/api/content/{id}/reject", put(reject_content))
}

/// Unwrap a JSON body, reporting malformed payloads as 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn create_draft(
    State(state): State<AppState>,
    subject: Subject,
    payload: Result<Json<ContentInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ContentItem>)> {
    let input = json_body(payload)?;
    let item = state.content().create(&subject, input, true).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn create_and_submit(
    State(state): State<AppState>,
    subject: Subject,
    payload: Result<Json<ContentInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ContentItem>)> {
    let input = json_body(payload)?;
    let item = state.content().create(&subject, input, false).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn my_submissions(
    State(state): State<AppState>,
    subject: Subject,
) -> AppResult<Json<Vec<ContentItem>>> {
    Ok(Json(state.content().list_mine(&subject).await?))
}

async fn approved(
    State(state): State<AppState>,
    subject: Subject,
) -> AppResult<Json<Vec<ContentItem>>> {
    Ok(Json(state.content().list_approved(&subject).await?))
}

async fn pending(
    State(state): State<AppState>,
    subject: Subject,
) -> AppResult<Json<Vec<ContentItem>>> {
    Ok(Json(
        state
            .content()
            .list_by_status(&subject, ContentStatus::Pending)
            .await?,
    ))
}

async fn get_content(
    State(state): State<AppState>,
    subject: Subject,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContentItem>> {
    Ok(Json(state.content().get(&subject, id).await?))
}

async fn update_content(
    State(state): State<AppState>,
    subject: Subject,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> AppResult<Json<ContentItem>> {
    let request = json_body(payload)?;
    let item = state
        .content()
        .update(&subject, id, request.content, request.submit)
        .await?;
    Ok(Json(item))
}

async fn delete_content(
    State(state): State<AppState>,
    subject: Subject,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.content().delete(&subject, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn approve_content(
    State(state): State<AppState>,
    subject: Subject,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ModerationReceipt>> {
    Ok(Json(state.content().approve(&subject, id).await?))
}

async fn reject_content(
    State(state): State<AppState>,
    subject: Subject,
    Path(id): Path<Uuid>,
    payload: Result<Json<RejectRequest>, JsonRejection>,
) -> AppResult<Json<ModerationReceipt>> {
    let request = json_body(payload)?;
    Ok(Json(state.content().reject(&subject, id, request).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn update_request_flattens_content_fields() {
        let request: UpdateRequest = serde_json::from_value(serde_json::json!({
            "title": "Rizz",
            "term": "rizz",
            "categorySlug": "slang-vocab",
            "body": "{\"description\":\"charm\"}",
            "submit": true
        }))
        .unwrap();
        assert!(request.submit);
        assert_eq!(request.content.category_slug, "slang-vocab");
        assert!(request.content.body.is_string());
    }

    #[test]
    fn update_request_defaults_to_save() {
        let request: UpdateRequest =
            serde_json::from_value(serde_json::json!({ "title": "Rizz" })).unwrap();
        assert!(!request.submit);
        assert!(request.content.body.is_null());
    }
}
