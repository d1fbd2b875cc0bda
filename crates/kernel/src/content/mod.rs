//! Content lifecycle and moderation.
//!
//! This module provides:
//! - LessonBody: the structured lesson payload and its validator
//! - Moderation state machine: legal transitions and their side effects
//! - ContentRepository: in-memory and PostgreSQL item stores
//! - CategoryRegistry: the category directory used for validation
//! - Catalog projection: the public, category-grouped view
//! - ContentService: the gated operations the HTTP layer calls

pub mod catalog;
pub mod category;
pub mod error;
pub mod lesson_body;
pub mod moderation;
pub mod pg_store;
pub mod store;
mod item_service;

pub use catalog::{CategoryGroup, project_catalog};
pub use category::CategoryRegistry;
pub use error::{ContentError, ContentResult};
pub use item_service::{ContentInput, ContentService, ModerationReceipt, RejectRequest};
pub use lesson_body::{Difficulty, KeyTerm, LessonBody, SchemaError, Section, Strictness};
pub use moderation::{Change, ModerationEvent, Planned};
pub use pg_store::PgContentStore;
pub use store::{ContentFilter, ContentRepository, MemoryContentStore, StatusCounts};
