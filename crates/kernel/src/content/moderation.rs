//! Moderation state machine.
//!
//! The legal status transitions, who may trigger each one, and the side
//! effects a transition has on rejection feedback. Everything here is pure;
//! the store calls [`plan`] while holding the item exclusively and writes the
//! result back in one step.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::content::error::{ContentError, ContentResult};
use crate::models::{ContentFields, ContentItem, ContentStatus, RejectionReason};

/// Events that move an item through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationEvent {
    CreateDraft,
    CreateAndSubmit,
    Save,
    Submit,
    Delete,
    Approve,
    Reject,
    EditAndSubmit,
    EditAndSave,
}

impl ModerationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateDraft => "CREATE_DRAFT",
            Self::CreateAndSubmit => "CREATE_AND_SUBMIT",
            Self::Save => "SAVE",
            Self::Submit => "SUBMIT",
            Self::Delete => "DELETE",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::EditAndSubmit => "EDIT_AND_SUBMIT",
            Self::EditAndSave => "EDIT_AND_SAVE",
        }
    }

    /// Whether the event requires the body to pass strict validation.
    pub fn requires_complete_content(&self) -> bool {
        matches!(
            self,
            Self::CreateAndSubmit | Self::Submit | Self::EditAndSubmit
        )
    }

    /// Event for a contributor update, given the item's current status.
    ///
    /// Drafts are saved or submitted; anything past DRAFT is edited. Whether
    /// the edit is legal from that status is decided by [`next_status`].
    pub fn for_update(current: ContentStatus, submit: bool) -> Self {
        match (current, submit) {
            (ContentStatus::Draft, false) => Self::Save,
            (ContentStatus::Draft, true) => Self::Submit,
            (_, false) => Self::EditAndSave,
            (_, true) => Self::EditAndSubmit,
        }
    }

    /// Event for a contributor creating a new item.
    pub fn for_create(as_draft: bool) -> Self {
        if as_draft {
            Self::CreateDraft
        } else {
            Self::CreateAndSubmit
        }
    }
}

impl fmt::Display for ModerationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status an item lands in after creation.
pub fn initial_status(event: ModerationEvent) -> Option<ContentStatus> {
    match event {
        ModerationEvent::CreateDraft => Some(ContentStatus::Draft),
        ModerationEvent::CreateAndSubmit => Some(ContentStatus::Pending),
        _ => None,
    }
}

/// Status after applying `event` to an item in `from`.
///
/// `Ok(None)` means the record is destroyed.
pub fn next_status(
    from: ContentStatus,
    event: ModerationEvent,
) -> ContentResult<Option<ContentStatus>> {
    use ContentStatus::*;
    use ModerationEvent::*;

    let to = match (from, event) {
        (Draft, Save) => Some(Draft),
        (Draft, Submit) => Some(Pending),
        (Draft, Delete) => None,
        (Pending, Approve) => Some(Approved),
        (Pending, Reject) => Some(Rejected),
        (Rejected, EditAndSubmit) => Some(Pending),
        (Rejected, EditAndSave) => Some(Rejected),
        (Approved, EditAndSubmit) => Some(Pending),
        _ => return Err(ContentError::IllegalTransition { from, event }),
    };
    Ok(to)
}

/// Requested change, as seen by the state machine.
#[derive(Debug, Clone)]
pub enum Change {
    /// Contributor save/submit/edit carrying replacement fields.
    Edit {
        requester: Uuid,
        submit: bool,
        fields: ContentFields,
    },
    Approve {
        moderator: Uuid,
    },
    Reject {
        moderator: Uuid,
        reason: RejectionReason,
        comment: Option<String>,
    },
}

/// A transition that has passed every check, ready to be written.
#[derive(Debug, Clone)]
pub struct Planned {
    pub event: ModerationEvent,
    pub from: ContentStatus,
    pub item: ContentItem,
}

/// Check `change` against `current` and compute the replacement record.
///
/// Ownership is checked first so a non-owner always sees `NotOwner`, then
/// transition legality, then content completeness.
pub fn plan(current: &ContentItem, change: Change, now: DateTime<Utc>) -> ContentResult<Planned> {
    let from = current.status;
    let mut item = current.clone();

    let event = match change {
        Change::Edit {
            requester,
            submit,
            fields,
        } => {
            if requester != current.owner_id {
                return Err(ContentError::NotOwner);
            }
            let event = ModerationEvent::for_update(from, submit);
            let to = next_status(from, event)?.ok_or(ContentError::IllegalTransition { from, event })?;
            if event.requires_complete_content() {
                ensure_submittable(&fields)?;
            } else if to != ContentStatus::Draft {
                ensure_identified(&fields)?;
            }
            item.apply_fields(fields);
            item.status = to;
            event
        }
        Change::Approve { moderator } => {
            let event = ModerationEvent::Approve;
            let to = next_status(from, event)?.ok_or(ContentError::IllegalTransition { from, event })?;
            item.status = to;
            item.clear_rejection();
            item.reviewed_by = Some(moderator);
            item.reviewed_at = Some(now);
            event
        }
        Change::Reject {
            moderator,
            reason,
            comment,
        } => {
            let event = ModerationEvent::Reject;
            let to = next_status(from, event)?.ok_or(ContentError::IllegalTransition { from, event })?;
            item.status = to;
            item.rejection_reason = Some(reason);
            item.rejection_comment = comment;
            item.reviewed_by = Some(moderator);
            item.reviewed_at = Some(now);
            event
        }
    };

    if item.status == ContentStatus::Pending {
        item.clear_rejection();
    }
    item.touch(now);

    Ok(Planned { event, from, item })
}

/// Check that `current` may be deleted by `requester`.
pub fn check_delete(current: &ContentItem, requester: Uuid) -> ContentResult<()> {
    if requester != current.owner_id {
        return Err(ContentError::NotOwner);
    }
    match next_status(current.status, ModerationEvent::Delete)? {
        None => Ok(()),
        Some(_) => Err(ContentError::IllegalTransition {
            from: current.status,
            event: ModerationEvent::Delete,
        }),
    }
}

/// Strict checks applied when content leaves DRAFT.
pub fn ensure_submittable(fields: &ContentFields) -> ContentResult<()> {
    ensure_identified(fields)?;
    fields.body.ensure_complete()?;
    Ok(())
}

/// Title, term and category must stay set on anything past DRAFT, even when
/// the body is only saved.
pub fn ensure_identified(fields: &ContentFields) -> ContentResult<()> {
    if fields.title.trim().is_empty() {
        return Err(ContentError::schema("title", "must not be empty"));
    }
    if fields.term.trim().is_empty() {
        return Err(ContentError::schema("term", "must not be empty"));
    }
    if fields.category.is_none() {
        return Err(ContentError::schema("categorySlug", "a category is required"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::{Difficulty, LessonBody, Section};
    use crate::models::CategoryRef;

    fn complete_fields() -> ContentFields {
        ContentFields {
            title: "Slay".to_string(),
            term: "slay".to_string(),
            category: Some(CategoryRef {
                slug: "slang-vocab".to_string(),
                name: "Slang & Vocabulary".to_string(),
                description: String::new(),
            }),
            body: LessonBody {
                description: "To do something exceptionally well".to_string(),
                difficulty: Some(Difficulty::Beginner),
                sections: vec![Section {
                    heading: "Meaning".to_string(),
                    body: "Praise.".to_string(),
                }],
                ..LessonBody::default()
            },
        }
    }

    fn item(status: ContentStatus) -> ContentItem {
        ContentItem::new(Uuid::now_v7(), complete_fields(), status)
    }

    #[test]
    fn transition_table() {
        use ContentStatus::*;
        use ModerationEvent::*;

        let legal = [
            (Draft, Save, Some(Draft)),
            (Draft, Submit, Some(Pending)),
            (Draft, Delete, None),
            (Pending, Approve, Some(Approved)),
            (Pending, Reject, Some(Rejected)),
            (Rejected, EditAndSubmit, Some(Pending)),
            (Rejected, EditAndSave, Some(Rejected)),
            (Approved, EditAndSubmit, Some(Pending)),
        ];
        let events = [
            CreateDraft,
            CreateAndSubmit,
            Save,
            Submit,
            Delete,
            Approve,
            Reject,
            EditAndSubmit,
            EditAndSave,
        ];

        for from in ContentStatus::ALL {
            for event in events {
                let expected = legal
                    .iter()
                    .find(|(f, e, _)| *f == from && *e == event)
                    .map(|(_, _, to)| *to);
                match (next_status(from, event), expected) {
                    (Ok(to), Some(exp)) => assert_eq!(to, exp, "{from} --{event}-->"),
                    (Err(ContentError::IllegalTransition { .. }), None) => {}
                    (got, exp) => panic!("{from} --{event}--> got {got:?}, expected {exp:?}"),
                }
            }
        }
    }

    #[test]
    fn creation_events() {
        assert_eq!(
            initial_status(ModerationEvent::for_create(true)),
            Some(ContentStatus::Draft)
        );
        assert_eq!(
            initial_status(ModerationEvent::for_create(false)),
            Some(ContentStatus::Pending)
        );
        assert_eq!(initial_status(ModerationEvent::Submit), None);
    }

    #[test]
    fn update_event_resolution() {
        assert_eq!(
            ModerationEvent::for_update(ContentStatus::Draft, false),
            ModerationEvent::Save
        );
        assert_eq!(
            ModerationEvent::for_update(ContentStatus::Draft, true),
            ModerationEvent::Submit
        );
        assert_eq!(
            ModerationEvent::for_update(ContentStatus::Rejected, false),
            ModerationEvent::EditAndSave
        );
        assert_eq!(
            ModerationEvent::for_update(ContentStatus::Approved, true),
            ModerationEvent::EditAndSubmit
        );
    }

    #[test]
    fn pending_items_cannot_be_edited() {
        let current = item(ContentStatus::Pending);
        for submit in [false, true] {
            let err = plan(
                &current,
                Change::Edit {
                    requester: current.owner_id,
                    submit,
                    fields: complete_fields(),
                },
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ContentError::IllegalTransition {
                    from: ContentStatus::Pending,
                    ..
                }
            ));
        }
    }

    #[test]
    fn approved_items_can_only_be_resubmitted() {
        let current = item(ContentStatus::Approved);
        let err = plan(
            &current,
            Change::Edit {
                requester: current.owner_id,
                submit: false,
                fields: complete_fields(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::IllegalTransition { .. }));

        let planned = plan(
            &current,
            Change::Edit {
                requester: current.owner_id,
                submit: true,
                fields: complete_fields(),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(planned.item.status, ContentStatus::Pending);
        assert!(!planned.item.is_published());
    }

    #[test]
    fn non_owner_is_rejected_before_legality() {
        let current = item(ContentStatus::Pending);
        let err = plan(
            &current,
            Change::Edit {
                requester: Uuid::now_v7(),
                submit: true,
                fields: complete_fields(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::NotOwner));
    }

    #[test]
    fn submit_requires_complete_content() {
        let current = item(ContentStatus::Draft);
        let mut fields = complete_fields();
        fields.body.sections.clear();
        let err = plan(
            &current,
            Change::Edit {
                requester: current.owner_id,
                submit: true,
                fields: fields.clone(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::Schema { ref field, .. } if field == "sections"));

        // The same incomplete body may still be saved.
        let planned = plan(
            &current,
            Change::Edit {
                requester: current.owner_id,
                submit: false,
                fields,
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(planned.event, ModerationEvent::Save);
        assert_eq!(planned.item.status, ContentStatus::Draft);
    }

    #[test]
    fn submittable_requires_title_term_and_category() {
        let mut fields = complete_fields();
        fields.title = " ".to_string();
        assert!(matches!(
            ensure_submittable(&fields),
            Err(ContentError::Schema { ref field, .. }) if field == "title"
        ));

        let mut fields = complete_fields();
        fields.term.clear();
        assert!(matches!(
            ensure_submittable(&fields),
            Err(ContentError::Schema { ref field, .. }) if field == "term"
        ));

        let mut fields = complete_fields();
        fields.category = None;
        assert!(matches!(
            ensure_submittable(&fields),
            Err(ContentError::Schema { ref field, .. }) if field == "categorySlug"
        ));
    }

    #[test]
    fn reject_then_resubmit_clears_feedback() {
        let admin = Uuid::now_v7();
        let pending = item(ContentStatus::Pending);
        let rejected = plan(
            &pending,
            Change::Reject {
                moderator: admin,
                reason: RejectionReason::Inaccurate,
                comment: Some("fix X".to_string()),
            },
            Utc::now(),
        )
        .unwrap()
        .item;
        assert_eq!(rejected.status, ContentStatus::Rejected);
        assert_eq!(rejected.rejection_reason, Some(RejectionReason::Inaccurate));
        assert_eq!(rejected.rejection_comment.as_deref(), Some("fix X"));
        assert_eq!(rejected.reviewed_by, Some(admin));

        // Saving a rejected item keeps the feedback visible.
        let saved = plan(
            &rejected,
            Change::Edit {
                requester: rejected.owner_id,
                submit: false,
                fields: complete_fields(),
            },
            Utc::now(),
        )
        .unwrap()
        .item;
        assert_eq!(saved.status, ContentStatus::Rejected);
        assert_eq!(saved.rejection_reason, Some(RejectionReason::Inaccurate));

        let resubmitted = plan(
            &saved,
            Change::Edit {
                requester: saved.owner_id,
                submit: true,
                fields: complete_fields(),
            },
            Utc::now(),
        )
        .unwrap()
        .item;
        assert_eq!(resubmitted.status, ContentStatus::Pending);
        assert_eq!(resubmitted.rejection_reason, None);
        assert_eq!(resubmitted.rejection_comment, None);
    }

    #[test]
    fn saving_rejected_item_keeps_identity_fields() {
        let rejected = plan(
            &item(ContentStatus::Pending),
            Change::Reject {
                moderator: Uuid::now_v7(),
                reason: RejectionReason::PoorQuality,
                comment: None,
            },
            Utc::now(),
        )
        .unwrap()
        .item;

        let blank = ContentFields {
            title: " ".to_string(),
            term: String::new(),
            category: None,
            body: LessonBody::default(),
        };
        let err = plan(
            &rejected,
            Change::Edit {
                requester: rejected.owner_id,
                submit: false,
                fields: blank,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::Schema { ref field, .. } if field == "title"));

        // The body itself may be incomplete while the item stays rejected.
        let mut fields = complete_fields();
        fields.body.sections.clear();
        let saved = plan(
            &rejected,
            Change::Edit {
                requester: rejected.owner_id,
                submit: false,
                fields,
            },
            Utc::now(),
        )
        .unwrap()
        .item;
        assert_eq!(saved.status, ContentStatus::Rejected);
        assert!(saved.body.sections.is_empty());
    }

    #[test]
    fn approve_twice_is_illegal() {
        let pending = item(ContentStatus::Pending);
        let approved = plan(
            &pending,
            Change::Approve {
                moderator: Uuid::now_v7(),
            },
            Utc::now(),
        )
        .unwrap()
        .item;
        assert_eq!(approved.rejection_reason, None);
        let err = plan(
            &approved,
            Change::Approve {
                moderator: Uuid::now_v7(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ContentError::IllegalTransition {
                from: ContentStatus::Approved,
                event: ModerationEvent::Approve
            }
        ));
    }

    #[test]
    fn delete_only_from_draft() {
        for status in ContentStatus::ALL {
            let current = item(status);
            let result = check_delete(&current, current.owner_id);
            if status == ContentStatus::Draft {
                assert!(result.is_ok());
            } else {
                assert!(matches!(
                    result,
                    Err(ContentError::IllegalTransition {
                        event: ModerationEvent::Delete,
                        ..
                    })
                ));
            }
        }
        let draft = item(ContentStatus::Draft);
        assert!(matches!(
            check_delete(&draft, Uuid::now_v7()),
            Err(ContentError::NotOwner)
        ));
    }

    #[test]
    fn transitions_refresh_updated_at() {
        let pending = item(ContentStatus::Pending);
        let later = pending.updated_at + chrono::Duration::seconds(5);
        let planned = plan(
            &pending,
            Change::Approve {
                moderator: Uuid::now_v7(),
            },
            later,
        )
        .unwrap();
        assert_eq!(planned.item.updated_at, later);
        assert_eq!(planned.item.created_at, pending.created_at);
        assert_eq!(planned.from, ContentStatus::Pending);
    }
}
