//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::content::ContentError;
use crate::permissions::DenyReason;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Content(e) => match e {
                ContentError::Schema { .. } => StatusCode::BAD_REQUEST,
                ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                ContentError::NotOwner => StatusCode::FORBIDDEN,
                ContentError::NotAuthorized(DenyReason::Unauthenticated) => {
                    StatusCode::UNAUTHORIZED
                }
                ContentError::NotAuthorized(_) => StatusCode::FORBIDDEN,
                ContentError::IllegalTransition { .. } => StatusCode::CONFLICT,
                ContentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details are logged, never returned.
        let body = match &self {
            AppError::Content(ContentError::Storage(e)) => {
                tracing::error!(error = %format!("{e:#}"), "storage error");
                ErrorBody {
                    error: "internal server error".to_string(),
                    field: None,
                }
            }
            AppError::Content(ContentError::Schema { field, reason }) => ErrorBody {
                error: reason.clone(),
                field: Some(field.clone()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                field: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
