//! PostgreSQL content store.
//!
//! Each mutation runs in its own transaction: the row is locked with
//! `SELECT ... FOR UPDATE`, the mutation is checked against it, and the
//! replacement is written before commit. Any error drops the transaction,
//! which rolls it back.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::content::LessonBody;
use crate::content::error::{ContentError, ContentResult};
use crate::content::moderation::Planned;
use crate::content::store::{ContentFilter, ContentRepository, Mutation, RemovalCheck, StatusCounts};
use crate::models::{ContentItem, ContentStatus, RejectionReason};

const SELECT_COLUMNS: &str = "SELECT id, owner_id, title, term, category_slug, category_name, \
     category_description, body, status, rejection_reason, rejection_comment, reviewed_by, \
     reviewed_at, created_at, updated_at FROM content_item";

/// Row shape of the `content_item` table.
#[derive(Debug, sqlx::FromRow)]
struct ContentItemRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    term: String,
    category_slug: String,
    category_name: String,
    category_description: String,
    /// Serialized lesson body (JSON text).
    body: String,
    status: String,
    rejection_reason: Option<String>,
    rejection_comment: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentItemRow> for ContentItem {
    type Error = anyhow::Error;

    fn try_from(row: ContentItemRow) -> anyhow::Result<Self> {
        let body = LessonBody::parse(&row.body)
            .map_err(|e| anyhow::anyhow!("stored body of content item {} is invalid: {e}", row.id))?;
        let status = row.status.parse::<ContentStatus>()?;
        let rejection_reason = row
            .rejection_reason
            .as_deref()
            .map(str::parse::<RejectionReason>)
            .transpose()?;

        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            term: row.term,
            category_slug: row.category_slug,
            category_name: row.category_name,
            category_description: row.category_description,
            body,
            status,
            rejection_reason,
            rejection_comment: row.rejection_comment,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Content store persisted in PostgreSQL.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn serialize_body(item: &ContentItem) -> ContentResult<String> {
    item.body
        .serialize()
        .context("failed to serialize lesson body")
        .map_err(ContentError::Storage)
}

#[async_trait]
impl ContentRepository for PgContentStore {
    async fn insert(&self, item: &ContentItem) -> ContentResult<()> {
        let body = serialize_body(item)?;

        sqlx::query(
            r#"
            INSERT INTO content_item (
                id, owner_id, title, term, category_slug, category_name, category_description,
                body, status, rejection_reason, rejection_comment, reviewed_by, reviewed_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.title)
        .bind(&item.term)
        .bind(&item.category_slug)
        .bind(&item.category_name)
        .bind(&item.category_description)
        .bind(&body)
        .bind(item.status.as_str())
        .bind(item.rejection_reason.map(|r| r.as_str()))
        .bind(item.rejection_comment.as_deref())
        .bind(item.reviewed_by)
        .bind(item.reviewed_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .context("failed to insert content item")?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> ContentResult<Option<ContentItem>> {
        let row = sqlx::query_as::<_, ContentItemRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch content item")?;

        Ok(row.map(ContentItem::try_from).transpose()?)
    }

    async fn modify(&self, id: Uuid, mutation: Mutation) -> ContentResult<Planned> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start transaction")?;

        let row = sqlx::query_as::<_, ContentItemRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to lock content item")?;

        let Some(row) = row else {
            return Err(ContentError::NotFound(id));
        };
        let current = ContentItem::try_from(row)?;

        let planned = mutation(&current)?;
        let item = &planned.item;
        let body = serialize_body(item)?;

        sqlx::query(
            r#"
            UPDATE content_item SET
                title = $2,
                term = $3,
                category_slug = $4,
                category_name = $5,
                category_description = $6,
                body = $7,
                status = $8,
                rejection_reason = $9,
                rejection_comment = $10,
                reviewed_by = $11,
                reviewed_at = $12,
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&item.title)
        .bind(&item.term)
        .bind(&item.category_slug)
        .bind(&item.category_name)
        .bind(&item.category_description)
        .bind(&body)
        .bind(item.status.as_str())
        .bind(item.rejection_reason.map(|r| r.as_str()))
        .bind(item.rejection_comment.as_deref())
        .bind(item.reviewed_by)
        .bind(item.reviewed_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .context("failed to update content item")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(planned)
    }

    async fn remove(&self, id: Uuid, check: RemovalCheck) -> ContentResult<ContentItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start transaction")?;

        let row = sqlx::query_as::<_, ContentItemRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to lock content item")?;

        let Some(row) = row else {
            return Err(ContentError::NotFound(id));
        };
        let current = ContentItem::try_from(row)?;

        check(&current)?;

        sqlx::query("DELETE FROM content_item WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete content item")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(current)
    }

    async fn list(&self, filter: ContentFilter) -> ContentResult<Vec<ContentItem>> {
        let mut query = format!("{SELECT_COLUMNS} WHERE 1=1");
        let mut param_idx = 1;

        if filter.owner_id.is_some() {
            query.push_str(&format!(" AND owner_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.status.is_some() {
            query.push_str(&format!(" AND status = ${param_idx}"));
            param_idx += 1;
        }
        if filter.reviewed_by.is_some() {
            query.push_str(&format!(" AND reviewed_by = ${param_idx}"));
        }
        query.push_str(" ORDER BY created_at, id");

        let mut query_builder = sqlx::query_as::<_, ContentItemRow>(&query);
        if let Some(owner_id) = filter.owner_id {
            query_builder = query_builder.bind(owner_id);
        }
        if let Some(status) = filter.status {
            query_builder = query_builder.bind(status.as_str());
        }
        if let Some(reviewed_by) = filter.reviewed_by {
            query_builder = query_builder.bind(reviewed_by);
        }

        let rows = query_builder
            .fetch_all(&self.pool)
            .await
            .context("failed to list content items")?;

        let items = rows
            .into_iter()
            .map(ContentItem::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(items)
    }

    async fn count_by_status(&self) -> ContentResult<StatusCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM content_item GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .context("failed to count content items")?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            let status = status.parse::<ContentStatus>()?;
            counts.add(status, u64::try_from(n).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

impl std::fmt::Debug for PgContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgContentStore").finish()
    }
}
