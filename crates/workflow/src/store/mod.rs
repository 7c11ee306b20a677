//! Persistence seams for the workflow
//!
//! Writes are compare-and-swap: a template update succeeds only if the
//! stored version and approval status still match the caller's
//! [`Revision`]; a contract update only if the stored version matches.
//! A miss is `AppError::VersionConflict`. Reminder cadence claims follow the
//! same pattern on the last send time.

mod memory;
mod sql;

pub use memory::MemoryStore;

use crate::model::{ActivityEntry, ContractRecord, ContractTemplate, Revision};
use crate::reminders::{Cadence, SchedulerState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pactforge_common::db::PendingFilter;
use pactforge_common::notifications::Notification;
use pactforge_common::{ApprovalStatus, Result};
use uuid::Uuid;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, id: Uuid) -> Result<Option<ContractTemplate>>;

    async fn list_templates(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractTemplate>>;

    async fn insert_template(&self, template: &ContractTemplate) -> Result<()>;

    /// Replace the stored template, appending any history entries it does
    /// not have yet
    async fn update_template(&self, template: &ContractTemplate, expected: Revision) -> Result<()>;

    /// Pending templates matching `filter`, oldest request first
    async fn pending_templates(&self, filter: PendingFilter) -> Result<Vec<ContractTemplate>>;

    async fn mark_template_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn get_contract(&self, id: Uuid) -> Result<Option<ContractRecord>>;

    async fn list_contracts(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractRecord>>;

    async fn insert_contract(&self, contract: &ContractRecord) -> Result<()>;

    async fn update_contract(&self, contract: &ContractRecord, expected_version: i32) -> Result<()>;

    async fn pending_contracts(&self, filter: PendingFilter) -> Result<Vec<ContractRecord>>;

    async fn mark_contract_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: ActivityEntry) -> Result<()>;

    /// Newest first
    async fn entries_for(&self, item_id: Uuid) -> Result<Vec<ActivityEntry>>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn push(&self, notification: Notification) -> Result<()>;
}

/// Cadence slots shared by every scheduler on the same storage
#[async_trait]
pub trait CadenceClaims: Send + Sync {
    /// Record a send of `cadence` at `now` if its interval has elapsed since
    /// the last one. At most one caller wins each interval.
    async fn claim_cadence(&self, cadence: Cadence, now: DateTime<Utc>) -> Result<bool>;

    async fn scheduler_state(&self) -> Result<SchedulerState>;
}
