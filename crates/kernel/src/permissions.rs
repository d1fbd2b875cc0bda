//! Authorization gate for content operations.
//!
//! Every content operation is checked here exactly once, before the store is
//! touched. The gate is a pure function of the subject, the requested
//! operation, and (optionally) the target item; it never reads storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ContentItem;

/// Role claim carried by an authenticated subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// No credentials were presented.
    Anonymous,
    /// A registered learner who may author content.
    User,
    /// A moderator who may approve or reject pending content.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" | "LEARNER" | "CONTRIBUTOR" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            other => Err(anyhow::anyhow!("unknown role: {other:?}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity an operation is performed on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    /// Subject ID (Uuid::nil() for anonymous).
    pub id: Uuid,
    pub role: Role,
}

impl Subject {
    /// Create an anonymous subject.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            role: Role::Anonymous,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role != Role::Anonymous
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Operations the gate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateContent,
    ReadContent,
    ListOwnContent,
    UpdateOwnContent,
    DeleteOwnContent,
    Approve,
    Reject,
    ListByStatus,
    ModerationStats,
    ListReviewed,
    ReadCatalog,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateContent => "create_content",
            Self::ReadContent => "read_content",
            Self::ListOwnContent => "list_own_content",
            Self::UpdateOwnContent => "update_own_content",
            Self::DeleteOwnContent => "delete_own_content",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::ListByStatus => "list_by_status",
            Self::ModerationStats => "moderation_stats",
            Self::ListReviewed => "list_reviewed",
            Self::ReadCatalog => "read_catalog",
        }
    }
}

/// Why the gate said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The operation needs an authenticated subject.
    Unauthenticated,
    /// The operation needs the admin role.
    AdminRequired,
    /// The subject is authenticated but does not own the target item.
    NotOwner,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthenticated => "authentication required",
            Self::AdminRequired => "admin role required",
            Self::NotOwner => "not the owner",
        })
    }
}

/// Gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(DenyReason),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `subject` may perform `operation`, optionally against `item`.
///
/// - The public catalog is open to everyone.
/// - Contributor operations need any authenticated subject; when the target
///   item is supplied, the subject must also own it.
/// - Reading a single item is open for approved items, otherwise limited to
///   the owner and admins.
/// - Moderation operations need the admin role.
pub fn authorize(subject: &Subject, operation: Operation, item: Option<&ContentItem>) -> Access {
    match operation {
        Operation::ReadCatalog => Access::Allow,

        Operation::ReadContent => match item {
            Some(item) if item.is_published() => Access::Allow,
            _ if !subject.is_authenticated() => Access::Deny(DenyReason::Unauthenticated),
            Some(item) if item.owner_id != subject.id && !subject.is_admin() => {
                Access::Deny(DenyReason::NotOwner)
            }
            _ => Access::Allow,
        },

        Operation::CreateContent
        | Operation::ListOwnContent
        | Operation::UpdateOwnContent
        | Operation::DeleteOwnContent => {
            if !subject.is_authenticated() {
                return Access::Deny(DenyReason::Unauthenticated);
            }
            match item {
                Some(item) if item.owner_id != subject.id => Access::Deny(DenyReason::NotOwner),
                _ => Access::Allow,
            }
        }

        Operation::Approve
        | Operation::Reject
        | Operation::ListByStatus
        | Operation::ModerationStats
        | Operation::ListReviewed => {
            if subject.is_admin() {
                Access::Allow
            } else if !subject.is_authenticated() {
                Access::Deny(DenyReason::Unauthenticated)
            } else {
                Access::Deny(DenyReason::AdminRequired)
            }
        }
    }
}
