//! Reminder scheduler
//!
//! Two independent jobs run on every tick:
//! - cadence reminders: a daily and a weekly summary of every pending
//!   template, sent to each approver at most once per interval across every
//!   scheduler sharing the same storage
//! - escalation: one email per item pending longer than the escalation
//!   threshold and not reminded recently, stamped with `last_reminder_sent`

use crate::approval::Approvable;
use crate::model::{ActivityEntry, ContractTemplate, ItemKind};
use crate::notifier::{escape_html, Notifier};
use crate::store::{ActivityLog, CadenceClaims, ContractStore, TemplateStore};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use pactforge_common::auth::DirectoryUser;
use pactforge_common::config::ReminderConfig;
use pactforge_common::db::PendingFilter;
use pactforge_common::metrics;
use pactforge_common::notifications::{self, NotificationOptions};
use pactforge_common::{AppError, EmailMessage, Result};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Items escalated concurrently within one batch
const ESCALATION_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
}

impl Cadence {
    pub fn interval(&self) -> Duration {
        match self {
            Cadence::Daily => Duration::hours(24),
            Cadence::Weekly => Duration::days(7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }
}

/// When each cadence last went out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerState {
    pub last_daily_sent: Option<DateTime<Utc>>,
    pub last_weekly_sent: Option<DateTime<Utc>>,
}

impl SchedulerState {
    pub(crate) fn slot(&mut self, cadence: Cadence) -> &mut Option<DateTime<Utc>> {
        match cadence {
            Cadence::Daily => &mut self.last_daily_sent,
            Cadence::Weekly => &mut self.last_weekly_sent,
        }
    }

    /// Record a send at `now` if the cadence interval has elapsed
    pub fn try_claim(&mut self, cadence: Cadence, now: DateTime<Utc>) -> bool {
        let slot = self.slot(cadence);
        let due = slot.map_or(true, |last| now - last >= cadence.interval());
        if due {
            *slot = Some(now);
        }
        due
    }
}

#[derive(Debug, Clone)]
pub struct ReminderPolicy {
    pub escalation_after: Duration,
    pub resend_after: Duration,
    pub item_timeout: std::time::Duration,
    pub daily_enabled: bool,
    pub weekly_enabled: bool,
}

impl From<&ReminderConfig> for ReminderPolicy {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            escalation_after: Duration::days(config.escalation_after_days),
            resend_after: Duration::days(config.resend_after_days),
            item_timeout: config.item_timeout(),
            daily_enabled: config.daily_enabled,
            weekly_enabled: config.weekly_enabled,
        }
    }
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self::from(&ReminderConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CadenceReport {
    pub cadence: Cadence,
    /// False when the cadence was not due
    pub dispatched: bool,
    pub pending: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl CategoryReport {
    fn from_outcomes(outcomes: Vec<(Uuid, Result<()>)>) -> Self {
        let mut report = CategoryReport {
            total: outcomes.len(),
            ..Default::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.successful += 1,
                Err(e) => {
                    report.failed += 1;
                    report.failures.push(ItemFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub templates: CategoryReport,
    pub contracts: CategoryReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub cadences: Vec<CadenceReport>,
    pub escalation: BatchReport,
}

pub struct ReminderScheduler {
    templates: Arc<dyn TemplateStore>,
    contracts: Arc<dyn ContractStore>,
    activity: Arc<dyn ActivityLog>,
    claims: Arc<dyn CadenceClaims>,
    notifier: Arc<Notifier>,
    policy: ReminderPolicy,
}

impl ReminderScheduler {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        contracts: Arc<dyn ContractStore>,
        activity: Arc<dyn ActivityLog>,
        claims: Arc<dyn CadenceClaims>,
        notifier: Arc<Notifier>,
        policy: ReminderPolicy,
    ) -> Self {
        Self {
            templates,
            contracts,
            activity,
            claims,
            notifier,
            policy,
        }
    }

    /// Last send of each cadence, as persisted
    pub async fn state(&self) -> Result<SchedulerState> {
        self.claims.scheduler_state().await
    }

    /// Run every enabled cadence, then the escalation batch
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let started = Instant::now();
        let mut cadences = Vec::new();
        for (cadence, enabled) in [
            (Cadence::Daily, self.policy.daily_enabled),
            (Cadence::Weekly, self.policy.weekly_enabled),
        ] {
            if !enabled {
                continue;
            }
            match self.dispatch_cadence(cadence, now).await {
                Ok(report) => cadences.push(report),
                Err(e) => error!(cadence = cadence.as_str(), error = %e, "Cadence reminder failed"),
            }
        }

        let escalation = self.run_escalation(now).await;
        metrics::record_reminder_batch(started.elapsed().as_secs_f64());
        Ok(TickReport {
            cadences,
            escalation: escalation?,
        })
    }

    /// Summarise all pending templates to every approver, once per interval
    #[instrument(skip(self), fields(cadence = cadence.as_str()))]
    pub async fn dispatch_cadence(&self, cadence: Cadence, now: DateTime<Utc>) -> Result<CadenceReport> {
        // Claim before sending so a concurrent tick sees the slot as taken
        let claimed = self.claims.claim_cadence(cadence, now).await?;
        let mut report = CadenceReport {
            cadence,
            dispatched: claimed,
            pending: 0,
            emails_sent: 0,
            emails_failed: 0,
        };
        if !claimed {
            debug!("Cadence not due");
            return Ok(report);
        }

        let pending = self.templates.pending_templates(PendingFilter::default()).await?;
        report.pending = pending.len();
        if pending.is_empty() {
            debug!("Nothing pending");
            return Ok(report);
        }

        let approvers = self.notifier.directory().approvers().await?;
        let params = HashMap::from([("count".to_string(), pending.len().to_string())]);

        for approver in &approvers {
            let message = EmailMessage {
                to: approver.email.clone(),
                subject: format!(
                    "{} approval reminder: {} item(s) pending",
                    capitalize(cadence.as_str()),
                    pending.len()
                ),
                html: self.summary_html(&pending),
            };
            match self.notifier.send_email(message).await {
                Ok(()) => report.emails_sent += 1,
                Err(e) => {
                    report.emails_failed += 1;
                    warn!(to = %approver.email, error = %e, "Reminder summary failed");
                    metrics::record_notification_failure("email");
                }
            }
            self.notifier
                .notify(
                    notifications::APPROVAL_REMINDER,
                    &params,
                    Some(approver.username.clone()),
                    NotificationOptions::default(),
                )
                .await;
        }

        info!(
            pending = report.pending,
            sent = report.emails_sent,
            failed = report.emails_failed,
            "Cadence reminders dispatched"
        );
        Ok(report)
    }

    /// Email approvers about each overdue item
    #[instrument(skip(self))]
    pub async fn run_escalation(&self, now: DateTime<Utc>) -> Result<BatchReport> {
        let filter = PendingFilter {
            requested_before: Some(now - self.policy.escalation_after),
            reminded_before: Some(now - self.policy.resend_after),
        };

        let templates = self.templates.pending_templates(filter).await?;
        let contracts = self.contracts.pending_contracts(filter).await?;
        if templates.is_empty() && contracts.is_empty() {
            debug!("No overdue items");
            return Ok(BatchReport::default());
        }

        let approvers = self.notifier.directory().approvers().await?;
        let approvers = approvers.as_slice();

        let template_outcomes = stream::iter(templates)
            .map(|t| async move { (t.id, self.escalate_bounded(&t, approvers, now).await) })
            .buffer_unordered(ESCALATION_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
        let contract_outcomes = stream::iter(contracts)
            .map(|c| async move { (c.id, self.escalate_bounded(&c, approvers, now).await) })
            .buffer_unordered(ESCALATION_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        let report = BatchReport {
            templates: CategoryReport::from_outcomes(template_outcomes),
            contracts: CategoryReport::from_outcomes(contract_outcomes),
        };
        info!(
            templates_total = report.templates.total,
            templates_failed = report.templates.failed,
            contracts_total = report.contracts.total,
            contracts_failed = report.contracts.failed,
            "Escalation batch finished"
        );
        Ok(report)
    }

    async fn escalate_bounded<T: Approvable + Sync>(
        &self,
        item: &T,
        approvers: &[DirectoryUser],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let outcome = match tokio::time::timeout(
            self.policy.item_timeout,
            self.escalate(item, approvers, now),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::ServiceUnavailable {
                message: format!(
                    "Reminder for {} {} timed out after {:?}",
                    T::KIND,
                    item.id(),
                    self.policy.item_timeout
                ),
            }),
        };

        metrics::record_reminder(T::KIND.as_str(), outcome.is_ok());
        if let Err(e) = &outcome {
            warn!(kind = %T::KIND, id = %item.id(), error = %e, "Escalation failed");
        }
        outcome
    }

    #[instrument(skip_all, fields(kind = %T::KIND, id = %item.id()))]
    async fn escalate<T: Approvable + Sync>(
        &self,
        item: &T,
        approvers: &[DirectoryUser],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if approvers.is_empty() {
            return Err(AppError::Configuration {
                message: "No approvers configured".to_string(),
            });
        }

        let requested_at = item.approval().approval_requested_at.unwrap_or(now);
        let days_pending = (now - requested_at).num_days();
        let name = item.display_name();
        let link = self.notifier.item_link(T::KIND, item.id());

        let subject = format!(
            "Reminder: {} \"{}\" has waited {} days for approval",
            T::KIND,
            name,
            days_pending
        );
        let html = format!(
            "<p>The {} <strong>{}</strong> was submitted by {} {} days ago and is \
             still waiting for approval.</p><p><a href=\"{}\">Review it</a></p>",
            T::KIND,
            escape_html(&name),
            escape_html(item.approval().approval_requested_by.as_deref().unwrap_or(item.owner())),
            days_pending,
            escape_html(&link),
        );

        let sends = approvers.iter().map(|approver| {
            let message = EmailMessage {
                to: approver.email.clone(),
                subject: subject.clone(),
                html: html.clone(),
            };
            async move { (approver, self.notifier.send_email(message).await) }
        });

        let mut delivered = 0usize;
        let mut failed = Vec::new();
        for (approver, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(to = %approver.email, error = %e, "Escalation email failed");
                    metrics::record_notification_failure("email");
                    failed.push(approver.email.clone());
                }
            }
        }

        // Stamp once at least one approver was reached
        if delivered == 0 {
            return Err(AppError::MailError {
                message: format!("No approver could be reached ({} tried)", approvers.len()),
            });
        }

        match T::KIND {
            ItemKind::Template => self.templates.mark_template_reminded(item.id(), now).await?,
            ItemKind::Contract => self.contracts.mark_contract_reminded(item.id(), now).await?,
        }

        let entry = ActivityEntry::new(
            T::KIND,
            item.id(),
            "reminder_sent",
            "system",
            json!({
                "daysPending": days_pending,
                "recipients": delivered,
                "failedRecipients": failed,
            }),
            now,
        );
        if let Err(e) = self.activity.record(entry).await {
            warn!(error = %e, "Failed to record reminder activity");
        }
        Ok(())
    }

    fn summary_html(&self, pending: &[ContractTemplate]) -> String {
        let items: String = pending
            .iter()
            .map(|t| {
                format!(
                    "<li><a href=\"{}\">{}</a> (version {}, requested by {})</li>",
                    escape_html(&self.notifier.item_link(ItemKind::Template, t.id)),
                    escape_html(&t.content.name),
                    t.version,
                    escape_html(t.approval.approval_requested_by.as_deref().unwrap_or("unknown")),
                )
            })
            .collect();
        format!(
            "<p>The following templates are waiting for your approval:</p><ul>{}</ul>",
            items
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
