//! Approval state machine shared by templates and contracts
//!
//! ```text
//! Draft ──submit──▶ PendingApproval ──approve──▶ Approved
//!   ▲                     │
//!   │                  reject
//!   │                     ▼
//!   └──── (edit) ◀──── Rejected ──submit──▶ PendingApproval
//! ```
//!
//! Every legal move goes through [`transition`]; anything else is an
//! `InvalidTransition` naming the current state and the attempted action.

use crate::model::{ApprovalRecord, ContractRecord, ContractTemplate, ItemKind};
use chrono::{DateTime, Utc};
use pactforge_common::{AppError, ApprovalStatus, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record that carries an approval lifecycle
pub trait Approvable {
    const KIND: ItemKind;

    fn id(&self) -> Uuid;

    fn version(&self) -> i32;

    fn approval(&self) -> &ApprovalRecord;

    fn approval_mut(&mut self) -> &mut ApprovalRecord;

    /// Human readable name used in notifications
    fn display_name(&self) -> String;

    /// Username of whoever created the record
    fn owner(&self) -> &str;

    /// Stamp the modification audit fields
    fn touch(&mut self, username: &str, now: DateTime<Utc>);

    fn on_approved(&mut self) {}

    /// Called when an edit takes away an earlier approval
    fn on_reset(&mut self) {}

    fn status(&self) -> ApprovalStatus {
        self.approval().status
    }
}

impl Approvable for ContractTemplate {
    const KIND: ItemKind = ItemKind::Template;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn approval(&self) -> &ApprovalRecord {
        &self.approval
    }

    fn approval_mut(&mut self) -> &mut ApprovalRecord {
        &mut self.approval
    }

    fn display_name(&self) -> String {
        self.content.name.clone()
    }

    fn owner(&self) -> &str {
        &self.created_by
    }

    fn touch(&mut self, username: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.last_modified_by = username.to_string();
    }

    fn on_approved(&mut self) {
        self.is_published = true;
    }

    fn on_reset(&mut self) {
        self.is_published = false;
    }
}

impl Approvable for ContractRecord {
    const KIND: ItemKind = ItemKind::Contract;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn approval(&self) -> &ApprovalRecord {
        &self.approval
    }

    fn approval_mut(&mut self) -> &mut ApprovalRecord {
        &mut self.approval
    }

    fn display_name(&self) -> String {
        self.ref_number.clone()
    }

    fn owner(&self) -> &str {
        &self.created_by
    }

    fn touch(&mut self, username: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.last_modified_by = username.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApprovalEvent {
    Submit,
    Approve {
        #[serde(default)]
        comments: Option<String>,
    },
    Reject {
        #[serde(default)]
        comments: Option<String>,
    },
}

impl ApprovalEvent {
    pub fn action(&self) -> &'static str {
        match self {
            ApprovalEvent::Submit => "submit",
            ApprovalEvent::Approve { .. } => "approve",
            ApprovalEvent::Reject { .. } => "reject",
        }
    }

    /// Status reached when the event is accepted
    pub fn target(&self) -> ApprovalStatus {
        match self {
            ApprovalEvent::Submit => ApprovalStatus::PendingApproval,
            ApprovalEvent::Approve { .. } => ApprovalStatus::Approved,
            ApprovalEvent::Reject { .. } => ApprovalStatus::Rejected,
        }
    }

    pub fn comments(&self) -> Option<&str> {
        match self {
            ApprovalEvent::Submit => None,
            ApprovalEvent::Approve { comments } | ApprovalEvent::Reject { comments } => {
                comments.as_deref()
            }
        }
    }

    pub fn is_allowed_from(&self, from: ApprovalStatus) -> bool {
        matches!(
            (self, from),
            (ApprovalEvent::Submit, ApprovalStatus::Draft | ApprovalStatus::Rejected)
                | (ApprovalEvent::Approve { .. }, ApprovalStatus::PendingApproval)
                | (ApprovalEvent::Reject { .. }, ApprovalStatus::PendingApproval)
        )
    }
}

/// Apply `event` to `item` in place, or explain why it cannot happen
pub fn transition<T: Approvable>(
    item: &mut T,
    event: &ApprovalEvent,
    username: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let from = item.status();
    if !event.is_allowed_from(from) {
        return Err(AppError::InvalidTransition {
            kind: T::KIND.as_str().to_string(),
            from: from.as_str().to_string(),
            attempted: event.action().to_string(),
        });
    }

    let record = item.approval_mut();
    record.status = event.target();
    match event {
        ApprovalEvent::Submit => {
            record.approval_requested_at = Some(now);
            record.approval_requested_by = Some(username.to_string());
        }
        ApprovalEvent::Approve { comments } => {
            record.approved_at = Some(now);
            record.approved_by = Some(username.to_string());
            record.approval_comments = comments.clone();
        }
        ApprovalEvent::Reject { comments } => {
            record.rejected_at = Some(now);
            record.rejected_by = Some(username.to_string());
            record.approval_comments = comments.clone();
        }
    }

    if matches!(event, ApprovalEvent::Approve { .. }) {
        item.on_approved();
    }
    item.touch(username, now);
    Ok(())
}

/// Approval does not survive a content edit
pub fn reset_after_edit<T: Approvable>(item: &mut T) {
    let record = item.approval_mut();
    if record.status == ApprovalStatus::Approved {
        record.status = ApprovalStatus::Draft;
        record.approved_at = None;
        record.approved_by = None;
        item.on_reset();
    }
}
