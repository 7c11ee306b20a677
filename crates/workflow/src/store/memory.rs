//! In-process store for tests and database-less local runs

use super::{ActivityLog, CadenceClaims, ContractStore, NotificationSink, TemplateStore};
use crate::model::{ActivityEntry, ContractRecord, ContractTemplate, Revision};
use crate::reminders::{Cadence, SchedulerState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pactforge_common::db::PendingFilter;
use pactforge_common::notifications::Notification;
use pactforge_common::{AppError, ApprovalStatus, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<Uuid, ContractTemplate>>,
    contracts: RwLock<HashMap<Uuid, ContractRecord>>,
    activity: RwLock<Vec<ActivityEntry>>,
    notifications: RwLock<Vec<Notification>>,
    schedule: RwLock<SchedulerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    pub async fn activity(&self) -> Vec<ActivityEntry> {
        self.activity.read().await.clone()
    }
}

fn is_pending_match(
    status: ApprovalStatus,
    requested_at: Option<DateTime<Utc>>,
    last_reminder: Option<DateTime<Utc>>,
    filter: &PendingFilter,
) -> bool {
    if status != ApprovalStatus::PendingApproval {
        return false;
    }
    if let Some(before) = filter.requested_before {
        match requested_at {
            Some(at) if at < before => {}
            _ => return false,
        }
    }
    if let Some(before) = filter.reminded_before {
        if matches!(last_reminder, Some(at) if at >= before) {
            return false;
        }
    }
    true
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_template(&self, id: Uuid) -> Result<Option<ContractTemplate>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn list_templates(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractTemplate>> {
        let mut templates: Vec<_> = self
            .templates
            .read()
            .await
            .values()
            .filter(|t| status.map_or(true, |s| t.status() == s))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(templates)
    }

    async fn insert_template(&self, template: &ContractTemplate) -> Result<()> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            return Err(AppError::Conflict {
                message: format!("Template {} already exists", template.id),
            });
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn update_template(&self, template: &ContractTemplate, expected: Revision) -> Result<()> {
        let mut templates = self.templates.write().await;
        let stored = templates
            .get_mut(&template.id)
            .ok_or_else(|| AppError::TemplateNotFound {
                id: template.id.to_string(),
            })?;

        if stored.revision() != expected {
            return Err(AppError::VersionConflict {
                id: template.id.to_string(),
                expected: expected.version,
                found: stored.version,
            });
        }

        let kept = stored.version_history.len();
        if template.version_history.len() < kept
            || template.version_history[..kept] != stored.version_history[..]
        {
            return Err(AppError::Conflict {
                message: "Version history is append-only".to_string(),
            });
        }

        *stored = template.clone();
        Ok(())
    }

    async fn pending_templates(&self, filter: PendingFilter) -> Result<Vec<ContractTemplate>> {
        let mut pending: Vec<_> = self
            .templates
            .read()
            .await
            .values()
            .filter(|t| {
                is_pending_match(
                    t.status(),
                    t.approval.approval_requested_at,
                    t.last_reminder_sent,
                    &filter,
                )
            })
            .cloned()
            .collect();
        pending.sort_by_key(|t| t.approval.approval_requested_at);
        Ok(pending)
    }

    async fn mark_template_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut templates = self.templates.write().await;
        let template = templates
            .get_mut(&id)
            .ok_or_else(|| AppError::TemplateNotFound { id: id.to_string() })?;
        template.last_reminder_sent = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn get_contract(&self, id: Uuid) -> Result<Option<ContractRecord>> {
        Ok(self.contracts.read().await.get(&id).cloned())
    }

    async fn list_contracts(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractRecord>> {
        let mut contracts: Vec<_> = self
            .contracts
            .read()
            .await
            .values()
            .filter(|c| status.map_or(true, |s| c.status() == s))
            .cloned()
            .collect();
        contracts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contracts)
    }

    async fn insert_contract(&self, contract: &ContractRecord) -> Result<()> {
        let mut contracts = self.contracts.write().await;
        if contracts.contains_key(&contract.id) {
            return Err(AppError::Conflict {
                message: format!("Contract {} already exists", contract.id),
            });
        }
        contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn update_contract(&self, contract: &ContractRecord, expected_version: i32) -> Result<()> {
        let mut contracts = self.contracts.write().await;
        let stored = contracts
            .get_mut(&contract.id)
            .ok_or_else(|| AppError::ContractNotFound {
                id: contract.id.to_string(),
            })?;

        if stored.version != expected_version {
            return Err(AppError::VersionConflict {
                id: contract.id.to_string(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = contract.clone();
        Ok(())
    }

    async fn pending_contracts(&self, filter: PendingFilter) -> Result<Vec<ContractRecord>> {
        let mut pending: Vec<_> = self
            .contracts
            .read()
            .await
            .values()
            .filter(|c| {
                is_pending_match(
                    c.status(),
                    c.approval.approval_requested_at,
                    c.last_reminder_sent,
                    &filter,
                )
            })
            .cloned()
            .collect();
        pending.sort_by_key(|c| c.approval.approval_requested_at);
        Ok(pending)
    }

    async fn mark_contract_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts
            .get_mut(&id)
            .ok_or_else(|| AppError::ContractNotFound { id: id.to_string() })?;
        contract.last_reminder_sent = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn record(&self, entry: ActivityEntry) -> Result<()> {
        self.activity.write().await.push(entry);
        Ok(())
    }

    async fn entries_for(&self, item_id: Uuid) -> Result<Vec<ActivityEntry>> {
        let mut entries: Vec<_> = self
            .activity
            .read()
            .await
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn push(&self, notification: Notification) -> Result<()> {
        self.notifications.write().await.push(notification);
        Ok(())
    }
}

#[async_trait]
impl CadenceClaims for MemoryStore {
    async fn claim_cadence(&self, cadence: Cadence, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.schedule.write().await.try_claim(cadence, now))
    }

    async fn scheduler_state(&self) -> Result<SchedulerState> {
        Ok(*self.schedule.read().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{transition, ApprovalEvent};
    use crate::model::TemplateContent;
    use crate::versioning::create_new_version;
    use chrono::Duration;

    fn template() -> ContractTemplate {
        ContractTemplate::new(
            TemplateContent {
                name: "NDA".into(),
                ..Default::default()
            },
            "alice",
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MemoryStore::new();
        let t = template();
        store.insert_template(&t).await.unwrap();

        let first = create_new_version(&t, "a", "alice", Utc::now());
        let second = create_new_version(&t, "b", "bob", Utc::now());

        store.update_template(&first, t.revision()).await.unwrap();
        let err = store.update_template(&second, t.revision()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::VersionConflict { expected: 1, found: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_status_change_is_part_of_revision() {
        let store = MemoryStore::new();
        let t = template();
        store.insert_template(&t).await.unwrap();

        let mut submitted = t.clone();
        transition(&mut submitted, &ApprovalEvent::Submit, "alice", Utc::now()).unwrap();
        store.update_template(&submitted, t.revision()).await.unwrap();

        // same version, stale status
        let mut again = t.clone();
        transition(&mut again, &ApprovalEvent::Submit, "bob", Utc::now()).unwrap();
        assert!(store.update_template(&again, t.revision()).await.unwrap_err().is_version_conflict());
    }

    #[tokio::test]
    async fn test_history_cannot_be_rewritten() {
        let store = MemoryStore::new();
        let t = create_new_version(&template(), "a", "alice", Utc::now());
        store.insert_template(&t).await.unwrap();

        let mut forged = create_new_version(&t, "b", "alice", Utc::now());
        forged.version_history[0].change_notes = "rewritten".into();
        let err = store.update_template(&forged, t.revision()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_pending_filter() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut old = template();
        transition(&mut old, &ApprovalEvent::Submit, "alice", now - Duration::days(10)).unwrap();
        let mut recent = template();
        transition(&mut recent, &ApprovalEvent::Submit, "alice", now - Duration::days(1)).unwrap();
        let mut reminded = template();
        transition(&mut reminded, &ApprovalEvent::Submit, "alice", now - Duration::days(10)).unwrap();
        reminded.last_reminder_sent = Some(now - Duration::days(1));

        for t in [&old, &recent, &reminded] {
            store.insert_template(t).await.unwrap();
        }

        let overdue = store
            .pending_templates(PendingFilter {
                requested_before: Some(now - Duration::days(7)),
                reminded_before: Some(now - Duration::days(3)),
            })
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, old.id);

        let all = store.pending_templates(PendingFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_cadence_claim_respects_interval() {
        let store = MemoryStore::new();
        let now = Utc::now();

        assert!(store.claim_cadence(Cadence::Weekly, now).await.unwrap());
        assert!(!store.claim_cadence(Cadence::Weekly, now + Duration::days(6)).await.unwrap());
        assert!(store.claim_cadence(Cadence::Daily, now).await.unwrap());
        assert!(store.claim_cadence(Cadence::Weekly, now + Duration::days(7)).await.unwrap());

        let state = store.scheduler_state().await.unwrap();
        assert_eq!(state.last_weekly_sent, Some(now + Duration::days(7)));
        assert_eq!(state.last_daily_sent, Some(now));
    }
}
