//! Content item model.
//!
//! A content item is the unit of moderation: a lesson authored by one
//! contributor, moved between statuses by the moderation state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::LessonBody;

/// Moderation status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ContentStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Draft,
        ContentStatus::Pending,
        ContentStatus::Approved,
        ContentStatus::Rejected,
    ];

    /// Return the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(anyhow::anyhow!(
                "invalid content status: {s:?} (expected DRAFT, PENDING, APPROVED, or REJECTED)"
            )),
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an admin rejected an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    Inaccurate,
    Inappropriate,
    #[serde(rename = "Poor Quality")]
    PoorQuality,
    Other,
}

impl RejectionReason {
    /// Return the wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inaccurate => "Inaccurate",
            Self::Inappropriate => "Inappropriate",
            Self::PoorQuality => "Poor Quality",
            Self::Other => "Other",
        }
    }

    /// Whether a free-text comment must accompany this reason.
    pub fn requires_comment(&self) -> bool {
        matches!(self, Self::Other)
    }
}

impl FromStr for RejectionReason {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "Inaccurate" => Ok(Self::Inaccurate),
            "Inappropriate" => Ok(Self::Inappropriate),
            "Poor Quality" => Ok(Self::PoorQuality),
            "Other" => Ok(Self::Other),
            other => Err(anyhow::anyhow!("invalid rejection reason: {other:?}")),
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Contributor who created the item. Never changes.
    pub owner_id: Uuid,

    pub title: String,

    /// The slang term or concept the lesson teaches.
    pub term: String,

    /// Category join key; empty only while DRAFT.
    pub category_slug: String,

    /// Denormalized from the category directory.
    pub category_name: String,

    /// Denormalized from the category directory.
    pub category_description: String,

    /// Structured lesson payload.
    pub body: LessonBody,

    pub status: ContentStatus,

    /// Present iff `status == Rejected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<RejectionReason>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_comment: Option<String>,

    /// Admin who made the last approve/reject decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Contributor-supplied fields, already resolved against the category
/// directory and parsed leniently.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFields {
    pub title: String,
    pub term: String,
    pub category: Option<CategoryRef>,
    pub body: LessonBody,
}

/// Denormalized category reference carried by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub slug: String,
    pub name: String,
    pub description: String,
}

impl ContentItem {
    /// Build a new item owned by `owner_id` in the given initial status.
    pub fn new(owner_id: Uuid, fields: ContentFields, status: ContentStatus) -> Self {
        let now = Utc::now();
        let mut item = Self {
            id: Uuid::now_v7(),
            owner_id,
            title: String::new(),
            term: String::new(),
            category_slug: String::new(),
            category_name: String::new(),
            category_description: String::new(),
            body: LessonBody::default(),
            status,
            rejection_reason: None,
            rejection_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        item.apply_fields(fields);
        item
    }

    /// Check if this item is visible in the public catalog.
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Approved
    }

    /// Replace contributor-editable fields.
    pub fn apply_fields(&mut self, fields: ContentFields) {
        self.title = fields.title;
        self.term = fields.term;
        match fields.category {
            Some(category) => {
                self.category_slug = category.slug;
                self.category_name = category.name;
                self.category_description = category.description;
            }
            None => {
                self.category_slug.clear();
                self.category_name.clear();
                self.category_description.clear();
            }
        }
        self.body = fields.body;
    }

    /// Remove rejection feedback.
    pub fn clear_rejection(&mut self) {
        self.rejection_reason = None;
        self.rejection_comment = None;
    }

    /// Refresh `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// The category this item is filed under, if any.
    pub fn category(&self) -> Option<CategoryRef> {
        if self.category_slug.is_empty() {
            return None;
        }
        Some(CategoryRef {
            slug: self.category_slug.clone(),
            name: self.category_name.clone(),
            description: self.category_description.clone(),
        })
    }
}
