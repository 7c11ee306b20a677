//! PactForge Workflow
//!
//! Lifecycle of templates and contracts once they exist:
//! - Template version chain (snapshot, edit, restore, diff)
//! - Approval state machine with best-effort notifications
//! - Compare-and-swap persistence behind store traits
//! - Reminder scheduler for items stuck waiting on an approver

pub mod approval;
pub mod model;
pub mod notifier;
pub mod reminders;
pub mod runtime;
pub mod service;
pub mod store;
pub mod versioning;

#[cfg(test)]
mod testing;

pub use approval::{transition, Approvable, ApprovalEvent};
pub use model::{
    ActivityEntry, ApprovalRecord, ContractRecord, ContractTemplate, ItemKind, Revision,
    TemplateContent, TemplateEdit, TemplateVersion,
};
pub use notifier::Notifier;
pub use reminders::{Cadence, ReminderPolicy, ReminderScheduler, SchedulerState, TickReport};
pub use runtime::{Stores, Workflow, IN_MEMORY_DATABASE};
pub use service::{ContractService, TemplateService};
pub use store::{
    ActivityLog, CadenceClaims, ContractStore, MemoryStore, NotificationSink, TemplateStore,
};
pub use versioning::{
    apply_edit, compare_versions, create_new_version, restore_version, TemplateDiff, VersionRef,
};
