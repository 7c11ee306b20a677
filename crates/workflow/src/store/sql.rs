//! Store traits over the Postgres `Repository`

use super::{ActivityLog, CadenceClaims, ContractStore, NotificationSink, TemplateStore};
use crate::model::{
    ActivityEntry, ApprovalRecord, ContractRecord, ContractTemplate, ItemKind, Revision,
    TemplateContent, TemplateVersion,
};
use crate::reminders::{Cadence, SchedulerState};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use futures::future::try_join_all;
use pactforge_common::db::models::{
    ActivityLogRow, ContractRow, NotificationRow, SchedulerClaimRow, TemplateRow,
    TemplateVersionRow,
};
use pactforge_common::db::PendingFilter;
use pactforge_common::notifications::Notification;
use pactforge_common::{AppError, ApprovalStatus, Repository, Result};
use uuid::Uuid;

fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn utc_opt(at: Option<DateTime<FixedOffset>>) -> Option<DateTime<Utc>> {
    at.map(utc)
}

fn fixed(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.into()
}

fn fixed_opt(at: Option<DateTime<Utc>>) -> Option<DateTime<FixedOffset>> {
    at.map(fixed)
}

fn duration_to_row(days: Option<u32>) -> Option<i32> {
    days.and_then(|d| i32::try_from(d).ok())
}

fn duration_from_row(days: Option<i32>) -> Option<u32> {
    days.and_then(|d| u32::try_from(d).ok())
}

fn responsibilities(value: serde_json::Value) -> Result<Vec<String>> {
    Ok(serde_json::from_value(value)?)
}

fn template_to_row(t: &ContractTemplate) -> Result<TemplateRow> {
    Ok(TemplateRow {
        id: t.id,
        name: t.content.name.clone(),
        description: t.content.description.clone(),
        contract_type: t.content.contract_type.clone(),
        responsibilities: serde_json::to_value(&t.content.responsibilities)?,
        default_duration: duration_to_row(t.content.default_duration),
        category: t.content.category.clone(),
        version: t.version,
        approval_status: t.approval.status.as_str().to_string(),
        is_published: t.is_published,
        approval_requested_at: fixed_opt(t.approval.approval_requested_at),
        approval_requested_by: t.approval.approval_requested_by.clone(),
        approved_at: fixed_opt(t.approval.approved_at),
        approved_by: t.approval.approved_by.clone(),
        rejected_at: fixed_opt(t.approval.rejected_at),
        rejected_by: t.approval.rejected_by.clone(),
        approval_comments: t.approval.approval_comments.clone(),
        last_reminder_sent: fixed_opt(t.last_reminder_sent),
        created_by: t.created_by.clone(),
        last_modified_by: t.last_modified_by.clone(),
        created_at: fixed(t.created_at),
        updated_at: fixed(t.updated_at),
    })
}

fn version_to_row(v: &TemplateVersion) -> Result<TemplateVersionRow> {
    Ok(TemplateVersionRow {
        id: v.id,
        template_id: v.template_id,
        version: v.version,
        name: v.content.name.clone(),
        description: v.content.description.clone(),
        contract_type: v.content.contract_type.clone(),
        responsibilities: serde_json::to_value(&v.content.responsibilities)?,
        default_duration: duration_to_row(v.content.default_duration),
        category: v.content.category.clone(),
        created_by: v.created_by.clone(),
        change_notes: v.change_notes.clone(),
        created_at: fixed(v.created_at),
    })
}

fn version_from_row(row: TemplateVersionRow) -> Result<TemplateVersion> {
    Ok(TemplateVersion {
        id: row.id,
        template_id: row.template_id,
        version: row.version,
        content: TemplateContent {
            name: row.name,
            description: row.description,
            contract_type: row.contract_type,
            responsibilities: responsibilities(row.responsibilities)?,
            default_duration: duration_from_row(row.default_duration),
            category: row.category,
        },
        created_at: utc(row.created_at),
        created_by: row.created_by,
        change_notes: row.change_notes,
    })
}

fn template_from_rows(row: TemplateRow, history: Vec<TemplateVersionRow>) -> Result<ContractTemplate> {
    let status = row.status();
    Ok(ContractTemplate {
        id: row.id,
        content: TemplateContent {
            name: row.name,
            description: row.description,
            contract_type: row.contract_type,
            responsibilities: responsibilities(row.responsibilities)?,
            default_duration: duration_from_row(row.default_duration),
            category: row.category,
        },
        version: row.version,
        version_history: history
            .into_iter()
            .map(version_from_row)
            .collect::<Result<_>>()?,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
        created_by: row.created_by,
        last_modified_by: row.last_modified_by,
        approval: ApprovalRecord {
            status,
            approval_requested_at: utc_opt(row.approval_requested_at),
            approval_requested_by: row.approval_requested_by,
            approved_at: utc_opt(row.approved_at),
            approved_by: row.approved_by,
            rejected_at: utc_opt(row.rejected_at),
            rejected_by: row.rejected_by,
            approval_comments: row.approval_comments,
        },
        is_published: row.is_published,
        last_reminder_sent: utc_opt(row.last_reminder_sent),
    })
}

fn contract_to_row(c: &ContractRecord) -> Result<ContractRow> {
    Ok(ContractRow {
        id: c.id,
        ref_number: c.ref_number.clone(),
        contract_data: serde_json::to_value(&c.contract_data)?,
        layout: serde_json::to_value(&c.layout)?,
        layout_version: c.layout.version().to_string(),
        approval_status: c.approval.status.as_str().to_string(),
        version: c.version,
        approval_requested_at: fixed_opt(c.approval.approval_requested_at),
        approval_requested_by: c.approval.approval_requested_by.clone(),
        approved_at: fixed_opt(c.approval.approved_at),
        approved_by: c.approval.approved_by.clone(),
        rejected_at: fixed_opt(c.approval.rejected_at),
        rejected_by: c.approval.rejected_by.clone(),
        approval_comments: c.approval.approval_comments.clone(),
        last_reminder_sent: fixed_opt(c.last_reminder_sent),
        created_by: c.created_by.clone(),
        last_modified_by: c.last_modified_by.clone(),
        created_at: fixed(c.created_at),
        updated_at: fixed(c.updated_at),
    })
}

fn contract_from_row(row: ContractRow) -> Result<ContractRecord> {
    let status = row.status();
    Ok(ContractRecord {
        id: row.id,
        ref_number: row.ref_number,
        contract_data: serde_json::from_value(row.contract_data)?,
        layout: serde_json::from_value(row.layout)?,
        version: row.version,
        approval: ApprovalRecord {
            status,
            approval_requested_at: utc_opt(row.approval_requested_at),
            approval_requested_by: row.approval_requested_by,
            approved_at: utc_opt(row.approved_at),
            approved_by: row.approved_by,
            rejected_at: utc_opt(row.rejected_at),
            rejected_by: row.rejected_by,
            approval_comments: row.approval_comments,
        },
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
        created_by: row.created_by,
        last_modified_by: row.last_modified_by,
        last_reminder_sent: utc_opt(row.last_reminder_sent),
    })
}

fn activity_from_row(row: ActivityLogRow) -> Result<ActivityEntry> {
    let item_type = match row.item_type.as_str() {
        "template" => ItemKind::Template,
        "contract" => ItemKind::Contract,
        other => {
            return Err(AppError::Internal {
                message: format!("Unknown activity item type '{}'", other),
            })
        }
    };
    Ok(ActivityEntry {
        id: row.id,
        item_id: row.item_id,
        item_type,
        action: row.action,
        actor: row.actor,
        details: row.details,
        created_at: utc(row.created_at),
    })
}

fn state_from_rows(rows: Vec<SchedulerClaimRow>) -> SchedulerState {
    let mut state = SchedulerState::default();
    for row in rows {
        let cadence = match row.cadence.as_str() {
            "daily" => Cadence::Daily,
            "weekly" => Cadence::Weekly,
            _ => continue,
        };
        *state.slot(cadence) = utc_opt(row.last_sent);
    }
    state
}

async fn load_template(repo: &Repository, row: TemplateRow) -> Result<ContractTemplate> {
    let history = repo.find_template_versions(row.id).await?;
    template_from_rows(row, history)
}

#[async_trait]
impl TemplateStore for Repository {
    async fn get_template(&self, id: Uuid) -> Result<Option<ContractTemplate>> {
        match self.find_template(id).await? {
            Some(row) => Ok(Some(load_template(self, row).await?)),
            None => Ok(None),
        }
    }

    async fn list_templates(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractTemplate>> {
        let rows = Repository::list_templates(self, status).await?;
        try_join_all(rows.into_iter().map(|row| load_template(self, row))).await
    }

    async fn insert_template(&self, template: &ContractTemplate) -> Result<()> {
        if !template.version_history.is_empty() {
            return Err(AppError::Validation {
                message: "New templates start without history".to_string(),
                field: Some("versionHistory".to_string()),
            });
        }
        Repository::insert_template(self, template_to_row(template)?).await?;
        Ok(())
    }

    async fn update_template(&self, template: &ContractTemplate, expected: Revision) -> Result<()> {
        // Stored history covers versions 1..expected; only newer snapshots are written
        let new_versions = template
            .version_history
            .iter()
            .filter(|v| v.version >= expected.version)
            .map(version_to_row)
            .collect::<Result<Vec<_>>>()?;

        self.update_template_if_version(
            template_to_row(template)?,
            expected.version,
            expected.status,
            new_versions,
        )
        .await
    }

    async fn pending_templates(&self, filter: PendingFilter) -> Result<Vec<ContractTemplate>> {
        let rows = Repository::pending_templates(self, filter).await?;
        try_join_all(rows.into_iter().map(|row| load_template(self, row))).await
    }

    async fn mark_template_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        Repository::mark_template_reminded(self, id, at).await
    }
}

#[async_trait]
impl ContractStore for Repository {
    async fn get_contract(&self, id: Uuid) -> Result<Option<ContractRecord>> {
        self.find_contract(id).await?.map(contract_from_row).transpose()
    }

    async fn list_contracts(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractRecord>> {
        Repository::list_contracts(self, status)
            .await?
            .into_iter()
            .map(contract_from_row)
            .collect()
    }

    async fn insert_contract(&self, contract: &ContractRecord) -> Result<()> {
        Repository::insert_contract(self, contract_to_row(contract)?).await?;
        Ok(())
    }

    async fn update_contract(&self, contract: &ContractRecord, expected_version: i32) -> Result<()> {
        self.update_contract_if_version(contract_to_row(contract)?, expected_version)
            .await
    }

    async fn pending_contracts(&self, filter: PendingFilter) -> Result<Vec<ContractRecord>> {
        Repository::pending_contracts(self, filter)
            .await?
            .into_iter()
            .map(contract_from_row)
            .collect()
    }

    async fn mark_contract_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        Repository::mark_contract_reminded(self, id, at).await
    }
}

#[async_trait]
impl ActivityLog for Repository {
    async fn record(&self, entry: ActivityEntry) -> Result<()> {
        self.insert_activity(ActivityLogRow {
            id: entry.id,
            item_id: entry.item_id,
            item_type: entry.item_type.as_str().to_string(),
            action: entry.action,
            actor: entry.actor,
            details: entry.details,
            created_at: fixed(entry.created_at),
        })
        .await
    }

    async fn entries_for(&self, item_id: Uuid) -> Result<Vec<ActivityEntry>> {
        self.list_activity(item_id)
            .await?
            .into_iter()
            .map(activity_from_row)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for Repository {
    async fn push(&self, notification: Notification) -> Result<()> {
        self.insert_notification(NotificationRow {
            id: notification.id,
            template_id: notification.template_id,
            recipient: notification.recipient,
            title: notification.title,
            message: notification.message,
            important: notification.options.important,
            requires_read_receipt: notification.options.requires_read_receipt,
            related_item_id: notification.options.related_item_id,
            related_item_type: notification.options.related_item_type,
            expires_at: fixed_opt(notification.options.expires_at),
            read_at: None,
            created_at: fixed(notification.created_at),
        })
        .await
    }
}

#[async_trait]
impl CadenceClaims for Repository {
    async fn claim_cadence(&self, cadence: Cadence, now: DateTime<Utc>) -> Result<bool> {
        Repository::claim_cadence(self, cadence.as_str(), now - cadence.interval(), now).await
    }

    async fn scheduler_state(&self) -> Result<SchedulerState> {
        Ok(state_from_rows(self.list_cadence_claims().await?))
    }
}
