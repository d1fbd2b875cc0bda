//! Database models.

pub mod content_item;

pub use content_item::{CategoryRef, ContentFields, ContentItem, ContentStatus, RejectionReason};
