//! Content item storage.
//!
//! [`ContentRepository`] owns content records. Mutations are expressed as a
//! closure that the backend runs while holding the record exclusively, so a
//! transition's legality is always decided against the status it is about
//! to overwrite.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use uuid::Uuid;

use crate::content::error::{ContentError, ContentResult};
use crate::content::moderation::Planned;
use crate::models::{ContentItem, ContentStatus};

/// Checks the current record and plans its replacement.
pub type Mutation = Box<dyn FnOnce(&ContentItem) -> ContentResult<Planned> + Send>;

/// Checks the current record before it is destroyed.
pub type RemovalCheck = Box<dyn FnOnce(&ContentItem) -> ContentResult<()> + Send>;

/// Optional filters for listing items. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub owner_id: Option<Uuid>,
    pub status: Option<ContentStatus>,
    pub reviewed_by: Option<Uuid>,
}

impl ContentFilter {
    pub fn owner(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn status(status: ContentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        self.owner_id.is_none_or(|o| item.owner_id == o)
            && self.status.is_none_or(|s| item.status == s)
            && self.reviewed_by.is_none_or(|r| item.reviewed_by == Some(r))
    }
}

/// Number of items in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub draft: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: ContentStatus, n: u64) {
        match status {
            ContentStatus::Draft => self.draft += n,
            ContentStatus::Pending => self.pending += n,
            ContentStatus::Approved => self.approved += n,
            ContentStatus::Rejected => self.rejected += n,
        }
    }
}

/// Durable keyed store of content items.
///
/// Implementations must run at most one mutation per item id at a time and
/// must apply a mutation's result atomically: either the whole replacement
/// record is written or nothing is.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Store a newly created item.
    async fn insert(&self, item: &ContentItem) -> ContentResult<()>;

    /// Load an item by ID.
    async fn find(&self, id: Uuid) -> ContentResult<Option<ContentItem>>;

    /// Apply `mutation` to the current record and persist its result.
    ///
    /// Fails with `NotFound` when no item has this id; errors returned by
    /// the mutation leave the record untouched.
    async fn modify(&self, id: Uuid, mutation: Mutation) -> ContentResult<Planned>;

    /// Destroy the record if `check` accepts it, returning what was removed.
    async fn remove(&self, id: Uuid, check: RemovalCheck) -> ContentResult<ContentItem>;

    /// List items matching `filter` in creation order.
    async fn list(&self, filter: ContentFilter) -> ContentResult<Vec<ContentItem>>;

    /// Count items per status.
    async fn count_by_status(&self) -> ContentResult<StatusCounts>;

    /// Whether the backend is reachable.
    async fn healthy(&self) -> bool;
}

/// In-process store backed by a `DashMap`.
///
/// A mutation runs while the entry's shard is write-locked, which gives the
/// per-item exclusive section. Mutations never await, so the lock is never
/// held across a suspension point.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    items: Arc<DashMap<Uuid, ContentItem>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn modify_locked(&self, id: Uuid, mutation: Mutation) -> ContentResult<Planned> {
        let Some(mut entry) = self.items.get_mut(&id) else {
            return Err(ContentError::NotFound(id));
        };
        let planned = mutation(entry.value())?;
        *entry.value_mut() = planned.item.clone();
        Ok(planned)
    }

    fn remove_locked(&self, id: Uuid, check: RemovalCheck) -> ContentResult<ContentItem> {
        match self.items.entry(id) {
            Entry::Occupied(entry) => {
                check(entry.get())?;
                Ok(entry.remove())
            }
            Entry::Vacant(_) => Err(ContentError::NotFound(id)),
        }
    }
}

#[async_trait]
impl ContentRepository for MemoryContentStore {
    async fn insert(&self, item: &ContentItem) -> ContentResult<()> {
        match self.items.entry(item.id) {
            Entry::Occupied(_) => Err(ContentError::Storage(anyhow::anyhow!(
                "content item {} already exists",
                item.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(item.clone());
                Ok(())
            }
        }
    }

    async fn find(&self, id: Uuid) -> ContentResult<Option<ContentItem>> {
        Ok(self.items.get(&id).map(|entry| entry.value().clone()))
    }

    async fn modify(&self, id: Uuid, mutation: Mutation) -> ContentResult<Planned> {
        self.modify_locked(id, mutation)
    }

    async fn remove(&self, id: Uuid, check: RemovalCheck) -> ContentResult<ContentItem> {
        self.remove_locked(id, check)
    }

    async fn list(&self, filter: ContentFilter) -> ContentResult<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(items)
    }

    async fn count_by_status(&self) -> ContentResult<StatusCounts> {
        let mut counts = StatusCounts::default();
        for entry in self.items.iter() {
            counts.add(entry.value().status, 1);
        }
        Ok(counts)
    }

    async fn healthy(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for MemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentStore")
            .field("items", &self.items.len())
            .finish()
    }
}
