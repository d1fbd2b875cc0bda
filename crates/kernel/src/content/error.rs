//! Content lifecycle errors.

use thiserror::Error;
use uuid::Uuid;

use crate::content::lesson_body::SchemaError;
use crate::content::moderation::ModerationEvent;
use crate::models::ContentStatus;
use crate::permissions::DenyReason;

/// Errors returned by content operations.
///
/// Every variant except `Storage` is decided by the lifecycle rules; none of
/// them leave a record partially modified.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid field `{field}`: {reason}")]
    Schema { field: String, reason: String },

    #[error("content item {0} not found")]
    NotFound(Uuid),

    #[error("only the owner may modify this content")]
    NotOwner,

    #[error("not authorized: {0}")]
    NotAuthorized(DenyReason),

    #[error("cannot {event} content in status {from}")]
    IllegalTransition {
        from: ContentStatus,
        event: ModerationEvent,
    },

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

impl ContentError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::NotFound(_) => "not_found",
            Self::NotOwner => "not_owner",
            Self::NotAuthorized(_) => "not_authorized",
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<SchemaError> for ContentError {
    fn from(e: SchemaError) -> Self {
        Self::Schema {
            field: e.field,
            reason: e.reason,
        }
    }
}

impl From<sqlx::Error> for ContentError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.into())
    }
}

/// Result type alias using ContentError.
pub type ContentResult<T> = Result<T, ContentError>;
