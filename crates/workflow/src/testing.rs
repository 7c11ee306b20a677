//! Test doubles shared by the service and scheduler tests

use async_trait::async_trait;
use pactforge_common::auth::ConfigDirectory;
use pactforge_common::{AppError, EmailMessage, EmailReceipt, Mailer, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::notifier::Notifier;
use crate::store::MemoryStore;

pub const APPROVER: &str = "approver@example.com";
pub const OWNER: &str = "owner@example.com";

/// Records every message; refuses the ones addressed to `failing`
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: HashSet<String>,
    unreachable: bool,
}

impl RecordingMailer {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Every send is a transport error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> usize {
        self.sent().iter().filter(|m| m.to == to).count()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt> {
        if self.unreachable {
            return Err(AppError::MailError {
                message: "connection refused".into(),
            });
        }
        if self.failing.contains(&message.to) {
            return Ok(EmailReceipt::failed("mailbox unavailable"));
        }
        self.sent.lock().unwrap().push(message);
        Ok(EmailReceipt::delivered())
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

pub fn notifier(store: &Arc<MemoryStore>, mailer: &Arc<RecordingMailer>) -> Notifier {
    notifier_for(store, mailer, &[APPROVER])
}

pub fn notifier_for(store: &Arc<MemoryStore>, mailer: &Arc<RecordingMailer>, approvers: &[&str]) -> Notifier {
    Notifier::new(
        mailer.clone(),
        store.clone(),
        Arc::new(ConfigDirectory::from_emails(approvers.iter().map(|a| a.to_string()))),
        "https://app.example.com",
        Duration::from_secs(5),
    )
}
