//! Content lifecycle service.
//!
//! Every operation follows the same path: the authorization gate, then the
//! store, which runs the moderation state machine while it holds the target
//! record. Updates check ownership under that lock before they validate the
//! payload; reject checks its reason before anything else.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::content::catalog::{CategoryGroup, project_catalog};
use crate::content::category::CategoryRegistry;
use crate::content::error::{ContentError, ContentResult};
use crate::content::lesson_body::{LessonBody, Strictness};
use crate::content::moderation::{
    Change, ModerationEvent, Planned, check_delete, ensure_submittable, initial_status, plan,
};
use crate::content::store::{ContentFilter, ContentRepository, StatusCounts};
use crate::metrics::Metrics;
use crate::models::{ContentFields, ContentItem, ContentStatus, RejectionReason};
use crate::permissions::{Access, DenyReason, Operation, Subject, authorize};

/// Contributor payload for create and update.
///
/// `body` is either the lesson object or a JSON string encoding it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentInput {
    pub title: String,
    pub term: String,
    pub category_slug: String,
    pub body: Value,
}

/// Admin payload for reject.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RejectRequest {
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// Outcome of an approve or reject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationReceipt {
    pub content_id: Uuid,
    pub status: ContentStatus,
    pub moderator_id: Uuid,
    pub reviewed_at: DateTime<Utc>,
}

/// Service for the content lifecycle.
#[derive(Clone)]
pub struct ContentService {
    inner: Arc<ContentServiceInner>,
}

struct ContentServiceInner {
    repo: Arc<dyn ContentRepository>,
    categories: Arc<CategoryRegistry>,
    metrics: Arc<Metrics>,
}

impl ContentService {
    /// Create a new content service.
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        categories: CategoryRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            inner: Arc::new(ContentServiceInner {
                repo,
                categories: Arc::new(categories),
                metrics,
            }),
        }
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.inner.categories
    }

    /// Whether the underlying store is reachable.
    pub async fn healthy(&self) -> bool {
        self.inner.repo.healthy().await
    }

    /// Create a new item as a draft or straight into the review queue.
    pub async fn create(
        &self,
        subject: &Subject,
        input: ContentInput,
        as_draft: bool,
    ) -> ContentResult<ContentItem> {
        let event = ModerationEvent::for_create(as_draft);
        let result = self.create_inner(subject, input, event).await;
        self.observe(event.as_str(), &result);
        result
    }

    async fn create_inner(
        &self,
        subject: &Subject,
        input: ContentInput,
        event: ModerationEvent,
    ) -> ContentResult<ContentItem> {
        self.gate(subject, Operation::CreateContent, None)?;

        let fields = prepare(&self.inner.categories, input)?;
        if event.requires_complete_content() {
            ensure_submittable(&fields)?;
        }
        let status = initial_status(event).unwrap_or(ContentStatus::Draft);

        let item = ContentItem::new(subject.id, fields, status);
        self.inner.repo.insert(&item).await?;

        info!(
            content_id = %item.id,
            owner_id = %item.owner_id,
            event = %event,
            to = %item.status,
            "content created"
        );
        Ok(item)
    }

    /// Save, submit, or edit an existing item.
    ///
    /// The event is resolved from the item's status at the moment the store
    /// locks it, together with the `submit` flag.
    pub async fn update(
        &self,
        subject: &Subject,
        id: Uuid,
        input: ContentInput,
        submit: bool,
    ) -> ContentResult<ContentItem> {
        let result = self.update_inner(subject, id, input, submit).await;
        let event = result.as_ref().map_or("UPDATE", |planned| planned.event.as_str());
        self.observe(event, &result);
        result.map(|planned| planned.item)
    }

    async fn update_inner(
        &self,
        subject: &Subject,
        id: Uuid,
        input: ContentInput,
        submit: bool,
    ) -> ContentResult<Planned> {
        self.gate(subject, Operation::UpdateOwnContent, None)?;

        let requester = subject.id;
        let categories = Arc::clone(&self.inner.categories);
        let planned = self
            .inner
            .repo
            .modify(
                id,
                Box::new(move |current: &ContentItem| {
                    // Ownership is decided before the payload is looked at.
                    if current.owner_id != requester {
                        return Err(ContentError::NotOwner);
                    }
                    let fields = prepare(&categories, input)?;
                    plan(
                        current,
                        Change::Edit {
                            requester,
                            submit,
                            fields,
                        },
                        Utc::now(),
                    )
                }),
            )
            .await?;

        log_transition(&planned);
        Ok(planned)
    }

    /// Delete a draft.
    pub async fn delete(&self, subject: &Subject, id: Uuid) -> ContentResult<()> {
        let result = self.delete_inner(subject, id).await;
        self.observe(ModerationEvent::Delete.as_str(), &result);
        result
    }

    async fn delete_inner(&self, subject: &Subject, id: Uuid) -> ContentResult<()> {
        self.gate(subject, Operation::DeleteOwnContent, None)?;

        let requester = subject.id;
        let removed = self
            .inner
            .repo
            .remove(
                id,
                Box::new(move |current: &ContentItem| check_delete(current, requester)),
            )
            .await?;

        info!(content_id = %removed.id, owner_id = %removed.owner_id, "content deleted");
        Ok(())
    }

    /// Approve a pending item.
    pub async fn approve(&self, subject: &Subject, id: Uuid) -> ContentResult<ModerationReceipt> {
        let result = self.moderate(subject, id, Operation::Approve, Change::Approve {
            moderator: subject.id,
        })
        .await;
        self.observe(ModerationEvent::Approve.as_str(), &result);
        result
    }

    /// Reject a pending item with a reason from the fixed set.
    ///
    /// The payload is checked before anything else, so a missing or unknown
    /// reason is a schema error whatever the subject or item status.
    pub async fn reject(
        &self,
        subject: &Subject,
        id: Uuid,
        request: RejectRequest,
    ) -> ContentResult<ModerationReceipt> {
        let result = match parse_rejection(request) {
            Ok((reason, comment)) => {
                self.moderate(subject, id, Operation::Reject, Change::Reject {
                    moderator: subject.id,
                    reason,
                    comment,
                })
                .await
            }
            Err(e) => Err(e),
        };
        self.observe(ModerationEvent::Reject.as_str(), &result);
        result
    }

    async fn moderate(
        &self,
        subject: &Subject,
        id: Uuid,
        operation: Operation,
        change: Change,
    ) -> ContentResult<ModerationReceipt> {
        self.gate(subject, operation, None)?;

        let planned = self
            .inner
            .repo
            .modify(
                id,
                Box::new(move |current: &ContentItem| plan(current, change, Utc::now())),
            )
            .await?;

        log_transition(&planned);
        let item = planned.item;
        Ok(ModerationReceipt {
            content_id: item.id,
            status: item.status,
            moderator_id: subject.id,
            reviewed_at: item.reviewed_at.unwrap_or(item.updated_at),
        })
    }

    /// Read a single item.
    ///
    /// The gate runs before the missing-id check, so an anonymous caller gets
    /// the same answer for an unknown id as for an unpublished item.
    pub async fn get(&self, subject: &Subject, id: Uuid) -> ContentResult<ContentItem> {
        let item = self.inner.repo.find(id).await?;
        self.gate(subject, Operation::ReadContent, item.as_ref())?;
        item.ok_or(ContentError::NotFound(id))
    }

    /// The subject's own items in creation order.
    pub async fn list_mine(&self, subject: &Subject) -> ContentResult<Vec<ContentItem>> {
        self.gate(subject, Operation::ListOwnContent, None)?;
        self.list_by_owner(subject.id).await
    }

    /// All items owned by `owner_id`. Not gated; callers decide who may ask.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> ContentResult<Vec<ContentItem>> {
        self.inner.repo.list(ContentFilter::owner(owner_id)).await
    }

    /// Moderation queue and status views.
    pub async fn list_by_status(
        &self,
        subject: &Subject,
        status: ContentStatus,
    ) -> ContentResult<Vec<ContentItem>> {
        self.gate(subject, Operation::ListByStatus, None)?;
        self.inner.repo.list(ContentFilter::status(status)).await
    }

    /// Approved items, grouped by category slug in first-seen order.
    pub async fn list_approved(&self, subject: &Subject) -> ContentResult<Vec<ContentItem>> {
        Ok(self
            .catalog(subject)
            .await?
            .into_iter()
            .flat_map(|group| group.items)
            .collect())
    }

    /// The public learner catalog.
    pub async fn catalog(&self, subject: &Subject) -> ContentResult<Vec<CategoryGroup>> {
        self.gate(subject, Operation::ReadCatalog, None)?;
        let items = self
            .inner
            .repo
            .list(ContentFilter::status(ContentStatus::Approved))
            .await?;
        Ok(project_catalog(&items))
    }

    /// Item counts per status.
    pub async fn moderation_stats(&self, subject: &Subject) -> ContentResult<StatusCounts> {
        self.gate(subject, Operation::ModerationStats, None)?;
        self.inner.repo.count_by_status().await
    }

    /// Items the subject last reviewed that still carry `decision`, most
    /// recent review first.
    pub async fn list_reviewed_by(
        &self,
        subject: &Subject,
        decision: ContentStatus,
    ) -> ContentResult<Vec<ContentItem>> {
        self.gate(subject, Operation::ListReviewed, None)?;
        if !matches!(decision, ContentStatus::Approved | ContentStatus::Rejected) {
            return Err(ContentError::schema(
                "decision",
                "must be APPROVED or REJECTED",
            ));
        }

        let mut items = self
            .inner
            .repo
            .list(ContentFilter {
                owner_id: None,
                status: Some(decision),
                reviewed_by: Some(subject.id),
            })
            .await?;
        items.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
        Ok(items)
    }

    fn gate(
        &self,
        subject: &Subject,
        operation: Operation,
        item: Option<&ContentItem>,
    ) -> ContentResult<()> {
        match authorize(subject, operation, item) {
            Access::Allow => Ok(()),
            Access::Deny(reason) => {
                self.inner.metrics.record_denial(operation.as_str());
                debug!(
                    subject_id = %subject.id,
                    role = %subject.role,
                    operation = operation.as_str(),
                    %reason,
                    "content access denied"
                );
                Err(match reason {
                    DenyReason::NotOwner => ContentError::NotOwner,
                    other => ContentError::NotAuthorized(other),
                })
            }
        }
    }

    fn observe<T>(&self, event: &str, result: &ContentResult<T>) {
        match result {
            Ok(_) => self.inner.metrics.record_transition(event, "ok"),
            Err(e) => {
                let event = match e {
                    ContentError::IllegalTransition { event, .. } => event.as_str(),
                    _ => event,
                };
                self.inner.metrics.record_transition(event, e.kind());
                match e {
                    ContentError::Storage(source) => {
                        error!(event, error = %format!("{source:#}"), "content storage failure");
                    }
                    other => debug!(event, error = %other, "content operation refused"),
                }
            }
        }
    }
}

/// Lenient body parse plus category lookup.
fn prepare(categories: &CategoryRegistry, input: ContentInput) -> ContentResult<ContentFields> {
    let body = LessonBody::validate(&input.body, Strictness::Lenient)?;
    let category = categories.resolve(&input.category_slug)?;
    Ok(ContentFields {
        title: input.title.trim().to_string(),
        term: input.term.trim().to_string(),
        category,
        body,
    })
}

fn log_transition(planned: &Planned) {
    info!(
        content_id = %planned.item.id,
        event = %planned.event,
        from = %planned.from,
        to = %planned.item.status,
        "content transition"
    );
}

/// Validate the reject payload.
fn parse_rejection(request: RejectRequest) -> ContentResult<(RejectionReason, Option<String>)> {
    let raw = request.reason.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(ContentError::schema("rejectionReason", "a reason is required"));
    }
    let reason = raw.parse::<RejectionReason>().map_err(|_| {
        ContentError::schema(
            "rejectionReason",
            format!(
                "unknown reason {raw:?} (expected Inaccurate, Inappropriate, Poor Quality, or Other)"
            ),
        )
    })?;

    let comment = request
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if reason.requires_comment() && comment.is_none() {
        return Err(ContentError::schema(
            "rejectionComment",
            "a comment is required when the reason is Other",
        ));
    }
    Ok((reason, comment))
}

impl std::fmt::Debug for ContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("categories", &self.inner.categories.len())
            .finish()
    }
}
