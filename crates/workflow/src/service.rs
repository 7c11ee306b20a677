//! Template and contract services
//!
//! Every write is read-modify-CAS. A `VersionConflict` means another writer
//! got there first; the whole read-modify-write is retried with exponential
//! backoff so the new state is derived from what is actually stored.
//! Activity logging and notifications run after the write commits and
//! never change its outcome.

use crate::approval::{transition, Approvable, ApprovalEvent};
use crate::model::{
    ActivityEntry, ApprovalRecord, ContractRecord, ContractTemplate, ItemKind, TemplateContent,
    TemplateEdit, TemplateVersion,
};
use crate::notifier::Notifier;
use crate::store::{ActivityLog, ContractStore, TemplateStore};
use crate::versioning::{apply_edit, compare_versions, restore_version, TemplateDiff, VersionRef};
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use pactforge_common::metrics;
use pactforge_common::{AppError, ApprovalStatus, Result};
use pactforge_layout::{generate_contract_layout, generate_reference_number, ContractData};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn conflict_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(250),
        max_elapsed_time: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}

/// Retry `attempt` while it fails with a version conflict
async fn with_cas_retry<T, F, Fut>(kind: ItemKind, attempt: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempt = &attempt;
    retry(conflict_backoff(), || async move {
        attempt().await.map_err(|e| {
            if e.is_version_conflict() {
                metrics::record_version_conflict(kind.as_str());
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .await
}

async fn log_activity(activity: &dyn ActivityLog, entry: ActivityEntry) {
    let (item_id, action) = (entry.item_id, entry.action.clone());
    if let Err(e) = activity.record(entry).await {
        warn!(item_id = %item_id, action, error = %e, "Failed to record activity");
    }
}

pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
    activity: Arc<dyn ActivityLog>,
    notifier: Arc<Notifier>,
}

impl TemplateService {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        activity: Arc<dyn ActivityLog>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            store,
            activity,
            notifier,
        }
    }

    #[instrument(skip(self, content), fields(name = %content.name))]
    pub async fn create(&self, content: TemplateContent, username: &str) -> Result<ContractTemplate> {
        if content.name.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Template name must not be empty".to_string(),
                field: Some("name".to_string()),
            });
        }

        let template = ContractTemplate::new(content, username, Utc::now());
        self.store.insert_template(&template).await?;
        info!(template_id = %template.id, "Template created");

        log_activity(
            self.activity.as_ref(),
            ActivityEntry::new(
                ItemKind::Template,
                template.id,
                "created",
                username,
                json!({ "version": template.version }),
                template.created_at,
            ),
        )
        .await;
        Ok(template)
    }

    pub async fn get(&self, id: Uuid) -> Result<ContractTemplate> {
        self.store
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound { id: id.to_string() })
    }

    pub async fn list(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractTemplate>> {
        self.store.list_templates(status).await
    }

    /// History, oldest first
    pub async fn versions(&self, id: Uuid) -> Result<Vec<TemplateVersion>> {
        Ok(self.get(id).await?.version_history)
    }

    pub async fn compare(&self, id: Uuid, from: VersionRef, to: VersionRef) -> Result<TemplateDiff> {
        let template = self.get(id).await?;
        let resolve = |r: VersionRef| {
            r.resolve(&template).ok_or_else(|| AppError::VersionNotFound {
                template_id: id.to_string(),
                version_id: match r {
                    VersionRef::Current => "current".to_string(),
                    VersionRef::Stored(v) => v.to_string(),
                },
            })
        };
        Ok(compare_versions(resolve(from)?, resolve(to)?))
    }

    pub async fn activity(&self, id: Uuid) -> Result<Vec<ActivityEntry>> {
        self.activity.entries_for(id).await
    }

    /// Load, derive the next state, compare-and-swap; retried on conflict
    async fn mutate<F>(&self, id: Uuid, derive: F) -> Result<ContractTemplate>
    where
        F: Fn(&ContractTemplate, DateTime<Utc>) -> Result<ContractTemplate> + Sync,
    {
        let derive = &derive;
        with_cas_retry(ItemKind::Template, || async move {
            let current = self.get(id).await?;
            let next = derive(&current, Utc::now())?;
            self.store.update_template(&next, current.revision()).await?;
            Ok(next)
        })
        .await
    }

    #[instrument(skip(self, edit), fields(template_id = %id))]
    pub async fn edit(
        &self,
        id: Uuid,
        edit: TemplateEdit,
        change_notes: &str,
        username: &str,
    ) -> Result<ContractTemplate> {
        if edit.is_empty() {
            return Err(AppError::Validation {
                message: "Edit changes no fields".to_string(),
                field: None,
            });
        }
        if matches!(&edit.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::Validation {
                message: "Template name must not be empty".to_string(),
                field: Some("name".to_string()),
            });
        }

        let updated = self
            .mutate(id, |current, now| {
                Ok(apply_edit(current, edit.clone(), change_notes, username, now))
            })
            .await?;
        metrics::record_template_version();
        info!(version = updated.version, "Template edited");

        log_activity(
            self.activity.as_ref(),
            ActivityEntry::new(
                ItemKind::Template,
                id,
                "edited",
                username,
                json!({ "version": updated.version, "changeNotes": change_notes }),
                updated.updated_at,
            ),
        )
        .await;
        Ok(updated)
    }

    /// Restore a historical version as a new version
    #[instrument(skip(self), fields(template_id = %id))]
    pub async fn restore(&self, id: Uuid, version_id: Uuid, username: &str) -> Result<ContractTemplate> {
        let updated = self
            .mutate(id, |current, now| {
                restore_version(current, version_id, username, now).ok_or_else(|| {
                    AppError::VersionNotFound {
                        template_id: id.to_string(),
                        version_id: version_id.to_string(),
                    }
                })
            })
            .await?;
        metrics::record_template_version();
        info!(version = updated.version, restored = %version_id, "Template version restored");

        log_activity(
            self.activity.as_ref(),
            ActivityEntry::new(
                ItemKind::Template,
                id,
                "restored",
                username,
                json!({ "version": updated.version, "restoredFrom": version_id }),
                updated.updated_at,
            ),
        )
        .await;
        Ok(updated)
    }

    pub async fn submit(&self, id: Uuid, username: &str) -> Result<ContractTemplate> {
        self.apply(id, ApprovalEvent::Submit, username).await
    }

    pub async fn approve(&self, id: Uuid, comments: Option<String>, username: &str) -> Result<ContractTemplate> {
        self.apply(id, ApprovalEvent::Approve { comments }, username).await
    }

    pub async fn reject(&self, id: Uuid, comments: Option<String>, username: &str) -> Result<ContractTemplate> {
        self.apply(id, ApprovalEvent::Reject { comments }, username).await
    }

    #[instrument(skip(self, event), fields(template_id = %id, action = event.action()))]
    pub async fn apply(&self, id: Uuid, event: ApprovalEvent, username: &str) -> Result<ContractTemplate> {
        let updated = self
            .mutate(id, |current, now| {
                let mut next = current.clone();
                transition(&mut next, &event, username, now)?;
                Ok(next)
            })
            .await?;

        after_transition(&updated, &event, username, self.activity.as_ref(), &self.notifier).await;
        Ok(updated)
    }
}

pub struct ContractService {
    store: Arc<dyn ContractStore>,
    activity: Arc<dyn ActivityLog>,
    notifier: Arc<Notifier>,
}

impl ContractService {
    pub fn new(
        store: Arc<dyn ContractStore>,
        activity: Arc<dyn ActivityLog>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            store,
            activity,
            notifier,
        }
    }

    /// Lay out the contract and persist it as a draft
    #[instrument(skip(self, data))]
    pub async fn generate(&self, data: ContractData, username: &str) -> Result<ContractRecord> {
        let layout = generate_contract_layout(&data);
        metrics::record_layout(layout.version());

        let ref_number = layout
            .ref_number()
            .map(str::to_string)
            .or_else(|| data.ref_number.clone())
            .unwrap_or_else(generate_reference_number);

        let now = Utc::now();
        let contract = ContractRecord {
            id: Uuid::new_v4(),
            ref_number,
            contract_data: data,
            layout,
            version: 1,
            approval: ApprovalRecord::default(),
            created_at: now,
            updated_at: now,
            created_by: username.to_string(),
            last_modified_by: username.to_string(),
            last_reminder_sent: None,
        };
        self.store.insert_contract(&contract).await?;
        info!(contract_id = %contract.id, ref_number = %contract.ref_number, "Contract generated");

        log_activity(
            self.activity.as_ref(),
            ActivityEntry::new(
                ItemKind::Contract,
                contract.id,
                "generated",
                username,
                json!({
                    "refNumber": contract.ref_number,
                    "layoutVersion": contract.layout.version(),
                }),
                now,
            ),
        )
        .await;
        Ok(contract)
    }

    pub async fn get(&self, id: Uuid) -> Result<ContractRecord> {
        self.store
            .get_contract(id)
            .await?
            .ok_or_else(|| AppError::ContractNotFound { id: id.to_string() })
    }

    pub async fn list(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractRecord>> {
        self.store.list_contracts(status).await
    }

    pub async fn activity(&self, id: Uuid) -> Result<Vec<ActivityEntry>> {
        self.activity.entries_for(id).await
    }

    pub async fn submit(&self, id: Uuid, username: &str) -> Result<ContractRecord> {
        self.apply(id, ApprovalEvent::Submit, username).await
    }

    pub async fn approve(&self, id: Uuid, comments: Option<String>, username: &str) -> Result<ContractRecord> {
        self.apply(id, ApprovalEvent::Approve { comments }, username).await
    }

    pub async fn reject(&self, id: Uuid, comments: Option<String>, username: &str) -> Result<ContractRecord> {
        self.apply(id, ApprovalEvent::Reject { comments }, username).await
    }

    #[instrument(skip(self, event), fields(contract_id = %id, action = event.action()))]
    pub async fn apply(&self, id: Uuid, event: ApprovalEvent, username: &str) -> Result<ContractRecord> {
        let event = &event;
        let updated = with_cas_retry(ItemKind::Contract, || async move {
            let current = self.get(id).await?;
            let mut next = current.clone();
            transition(&mut next, event, username, Utc::now())?;
            next.version += 1;
            self.store.update_contract(&next, current.version).await?;
            Ok(next)
        })
        .await?;

        after_transition(&updated, event, username, self.activity.as_ref(), &self.notifier).await;
        Ok(updated)
    }
}

async fn after_transition<T: Approvable + Sync>(
    item: &T,
    event: &ApprovalEvent,
    username: &str,
    activity: &dyn ActivityLog,
    notifier: &Notifier,
) {
    let status = item.status();
    info!(kind = %T::KIND, id = %item.id(), status = %status, "Approval status changed");
    metrics::record_transition(T::KIND.as_str(), status.as_str());

    log_activity(
        activity,
        ActivityEntry::new(
            T::KIND,
            item.id(),
            event.action(),
            username,
            json!({ "status": status, "comments": event.comments() }),
            Utc::now(),
        ),
    )
    .await;
    notifier.approval_changed(item, event, username).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TemplateStore};
    use crate::testing::{notifier, RecordingMailer, APPROVER, OWNER};
    use crate::versioning::create_new_version;
    use pactforge_common::notifications;

    struct Fixture {
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
        templates: TemplateService,
        contracts: ContractService,
    }

    fn fixture_with(mailer: RecordingMailer) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);
        let notifier = Arc::new(notifier(&store, &mailer));
        Fixture {
            templates: TemplateService::new(store.clone(), store.clone(), notifier.clone()),
            contracts: ContractService::new(store.clone(), store.clone(), notifier),
            store,
            mailer,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingMailer::default())
    }

    fn content(name: &str) -> TemplateContent {
        TemplateContent {
            name: name.into(),
            description: "Retail promoter placement".into(),
            contract_type: "promoter".into(),
            responsibilities: vec!["Attend shifts".into()],
            default_duration: Some(30),
            category: "retail".into(),
        }
    }

    fn rename(name: &str) -> TemplateEdit {
        TemplateEdit {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_approval_round_trip() {
        let f = fixture();
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();

        f.templates.submit(t.id, OWNER).await.unwrap();
        let approved = f
            .templates
            .approve(t.id, Some("Good".into()), APPROVER)
            .await
            .unwrap();
        assert_eq!(approved.status(), ApprovalStatus::Approved);
        assert!(approved.is_published);
        assert!(approved.approval.approved_at.is_some());
        assert_eq!(approved.approval.approved_by.as_deref(), Some(APPROVER));
        assert_eq!(approved.version, 1);

        let edited = f
            .templates
            .edit(t.id, rename("Promoter v2"), "rename", OWNER)
            .await
            .unwrap();
        assert_eq!(edited.status(), ApprovalStatus::Draft);
        assert_eq!(edited.version, 2);
        assert!(edited.approval.approved_by.is_none());

        let stored = f.templates.get(t.id).await.unwrap();
        assert_eq!(stored, edited);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let f = fixture();
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();

        let err = f.templates.approve(t.id, None, APPROVER).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert_eq!(err.status_code().as_u16(), 409);
        assert_eq!(f.templates.get(t.id).await.unwrap().status(), ApprovalStatus::Draft);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_transition() {
        let f = fixture_with(RecordingMailer::unreachable());
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();

        let submitted = f.templates.submit(t.id, OWNER).await.unwrap();
        assert_eq!(submitted.status(), ApprovalStatus::PendingApproval);
        assert_eq!(
            f.templates.get(t.id).await.unwrap().status(),
            ApprovalStatus::PendingApproval
        );

        let ids: Vec<String> = f
            .store
            .notifications()
            .await
            .into_iter()
            .map(|n| n.template_id)
            .collect();
        assert!(ids.contains(&notifications::GENERAL_ERROR.to_string()));
        assert!(ids.contains(&notifications::TEMPLATE_SUBMITTED.to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_edits_keep_version_invariant() {
        let f = Arc::new(fixture());
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let f = f.clone();
            handles.push(tokio::spawn(async move {
                f.templates
                    .edit(t.id, rename(&format!("Name {n}")), "concurrent", OWNER)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = f.templates.get(t.id).await.unwrap();
        assert_eq!(stored.version, 9);
        assert_eq!(stored.version_history.len(), 8);
        let numbers: Vec<i32> = stored.version_history.iter().map(|v| v.version).collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_stale_writer_gets_conflict_from_store() {
        let f = fixture();
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();
        f.templates.edit(t.id, rename("Fresh"), "edit", OWNER).await.unwrap();

        let stale = create_new_version(&t, "stale", "mallory", Utc::now());
        let err = f.store.update_template(&stale, t.revision()).await.unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn test_restore_and_compare() {
        let f = fixture();
        let t = f.templates.create(content("First"), OWNER).await.unwrap();
        f.templates.edit(t.id, rename("Second"), "edit", OWNER).await.unwrap();

        let history = f.templates.versions(t.id).await.unwrap();
        let first = history[0].id;

        let diff = f
            .templates
            .compare(t.id, VersionRef::Stored(first), VersionRef::Current)
            .await
            .unwrap();
        assert_eq!(diff.changed_fields(), vec!["name"]);

        let restored = f.templates.restore(t.id, first, OWNER).await.unwrap();
        assert_eq!(restored.content.name, "First");
        assert_eq!(restored.version, 3);

        let missing = f.templates.restore(t.id, Uuid::new_v4(), OWNER).await.unwrap_err();
        assert!(matches!(missing, AppError::VersionNotFound { .. }));

        let actions: Vec<String> = f
            .templates
            .activity(t.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["restored", "edited", "created"]);
    }

    #[tokio::test]
    async fn test_empty_edit_is_rejected() {
        let f = fixture();
        let t = f.templates.create(content("Promoter"), OWNER).await.unwrap();
        let err = f
            .templates
            .edit(t.id, TemplateEdit::default(), "nothing", OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let f = fixture();
        let err = f.templates.submit(Uuid::new_v4(), OWNER).await.unwrap_err();
        assert!(matches!(err, AppError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_contract_lifecycle() {
        let f = fixture();
        let data = ContractData {
            first_party_name_en: "Acme".into(),
            second_party_name_en: "Globex".into(),
            start_date: Some("2024-06-01".into()),
            end_date: Some("2024-06-30".into()),
            ..Default::default()
        };
        let contract = f.contracts.generate(data, OWNER).await.unwrap();
        assert!(contract.ref_number.starts_with("PAC-"));
        assert_eq!(contract.layout.version(), "1.0");
        assert_eq!(contract.version, 1);

        let submitted = f.contracts.submit(contract.id, OWNER).await.unwrap();
        assert_eq!(submitted.version, 2);
        let rejected = f
            .contracts
            .reject(contract.id, Some("Wrong dates".into()), APPROVER)
            .await
            .unwrap();
        assert_eq!(rejected.status(), ApprovalStatus::Rejected);
        assert_eq!(rejected.version, 3);

        assert_eq!(f.mailer.sent_to(APPROVER), 1);
        assert_eq!(f.mailer.sent_to(OWNER), 1);
        let ids: Vec<String> = f
            .store
            .notifications()
            .await
            .into_iter()
            .map(|n| n.template_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                notifications::CONTRACT_SUBMITTED.to_string(),
                notifications::CONTRACT_REJECTED.to_string()
            ]
        );
    }
}
