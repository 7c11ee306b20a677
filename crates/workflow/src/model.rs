//! Domain records for templates, contracts and their audit trail

use chrono::{DateTime, Utc};
use pactforge_common::ApprovalStatus;
use pactforge_layout::{ContractData, ContractLayoutDocument};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What an approval, activity entry or notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Template,
    Contract,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Template => "template",
            ItemKind::Contract => "contract",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The versioned content of a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub contract_type: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_duration: Option<u32>,
    #[serde(default)]
    pub category: String,
}

/// Immutable snapshot of superseded template content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersion {
    pub id: Uuid,
    pub template_id: Uuid,
    /// The template's version number while this content was current
    pub version: i32,
    #[serde(flatten)]
    pub content: TemplateContent,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub change_notes: String,
}

/// Approval state and its audit fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    #[serde(rename = "approvalStatus")]
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_requested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_comments: Option<String>,
}

/// An editable contract template with its full version history
///
/// `version` always equals `version_history.len() + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTemplate {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: TemplateContent,
    pub version: i32,
    pub version_history: Vec<TemplateVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub last_modified_by: String,
    #[serde(flatten)]
    pub approval: ApprovalRecord,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminder_sent: Option<DateTime<Utc>>,
}

impl ContractTemplate {
    /// A fresh draft at version 1 with no history
    pub fn new(content: TemplateContent, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            version: 1,
            version_history: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: username.to_string(),
            last_modified_by: username.to_string(),
            approval: ApprovalRecord::default(),
            is_published: false,
            last_reminder_sent: None,
        }
    }

    pub fn status(&self) -> ApprovalStatus {
        self.approval.status
    }

    pub fn find_version(&self, version_id: Uuid) -> Option<&TemplateVersion> {
        self.version_history.iter().find(|v| v.id == version_id)
    }

    /// The state a compare-and-swap write must still find in storage
    pub fn revision(&self) -> Revision {
        Revision {
            version: self.version,
            status: self.approval.status,
        }
    }
}

/// Optimistic concurrency precondition for template writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub version: i32,
    pub status: ApprovalStatus,
}

/// A partial content edit; absent fields keep their value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<Vec<String>>,
    #[serde(default)]
    pub default_duration: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TemplateEdit {
    pub fn is_empty(&self) -> bool {
        self == &TemplateEdit::default()
    }

    pub fn apply_to(self, content: &mut TemplateContent) {
        if let Some(name) = self.name {
            content.name = name;
        }
        if let Some(description) = self.description {
            content.description = description;
        }
        if let Some(contract_type) = self.contract_type {
            content.contract_type = contract_type;
        }
        if let Some(responsibilities) = self.responsibilities {
            content.responsibilities = responsibilities;
        }
        if let Some(duration) = self.default_duration {
            content.default_duration = Some(duration);
        }
        if let Some(category) = self.category {
            content.category = category;
        }
    }
}

/// A generated contract and its persisted layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: Uuid,
    pub ref_number: String,
    pub contract_data: ContractData,
    pub layout: ContractLayoutDocument,
    /// Bumped on every write
    pub version: i32,
    #[serde(flatten)]
    pub approval: ApprovalRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub last_modified_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminder_sent: Option<DateTime<Utc>>,
}

impl ContractRecord {
    pub fn status(&self) -> ApprovalStatus {
        self.approval.status
    }
}

/// One audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_type: ItemKind,
    pub action: String,
    pub actor: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        kind: ItemKind,
        item_id: Uuid,
        action: &str,
        actor: &str,
        details: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            item_type: kind,
            action: action.to_string(),
            actor: actor.to_string(),
            details,
            created_at: now,
        }
    }
}
