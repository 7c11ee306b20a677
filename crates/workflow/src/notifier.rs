//! Best-effort email and in-app notifications
//!
//! Nothing here fails the caller. Delivery problems are logged, counted and
//! turned into a `general-error` notification for the acting user.

use crate::approval::{Approvable, ApprovalEvent};
use crate::model::ItemKind;
use crate::store::NotificationSink;
use pactforge_common::auth::{DirectoryUser, UserDirectory};
use pactforge_common::metrics;
use pactforge_common::notifications::{self, NotificationOptions};
use pactforge_common::{AppError, EmailMessage, Mailer, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    sink: Arc<dyn NotificationSink>,
    directory: Arc<dyn UserDirectory>,
    app_base_url: String,
    email_timeout: Duration,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        sink: Arc<dyn NotificationSink>,
        directory: Arc<dyn UserDirectory>,
        app_base_url: impl Into<String>,
        email_timeout: Duration,
    ) -> Self {
        Self {
            mailer,
            sink,
            directory,
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
            email_timeout,
        }
    }

    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    /// Link to an item in the web app
    pub fn item_link(&self, kind: ItemKind, id: Uuid) -> String {
        format!("{}/{}s/{}", self.app_base_url, kind, id)
    }

    /// Send one email within the configured timeout
    pub async fn send_email(&self, message: EmailMessage) -> Result<()> {
        let timeout_ms = self.email_timeout.as_millis() as u64;
        match tokio::time::timeout(self.email_timeout, self.mailer.send_email(message)).await {
            Ok(receipt) => receipt?.into_result(),
            Err(_) => Err(AppError::MailTimeout { timeout_ms }),
        }
    }

    /// Expand a catalogue entry and store it; failures are logged only
    pub async fn notify(
        &self,
        template_id: &str,
        params: &HashMap<String, String>,
        recipient: Option<String>,
        options: NotificationOptions,
    ) {
        let Some(notification) = notifications::expand(template_id, params, recipient, options)
        else {
            warn!(template_id, "Unknown notification template");
            return;
        };
        if let Err(e) = self.sink.push(notification).await {
            warn!(template_id, error = %e, "Failed to store notification");
            metrics::record_notification_failure("in_app");
        }
    }

    /// Log a delivery failure and tell the acting user about it
    pub async fn report_failure(&self, actor: &str, context: &str, error: &AppError) {
        warn!(actor, context, error = %error, "Notification delivery failed");
        metrics::record_notification_failure("email");

        let params = HashMap::from([(
            "message".to_string(),
            format!("{}: {}", context, error),
        )]);
        self.notify(
            notifications::GENERAL_ERROR,
            &params,
            Some(actor.to_string()),
            NotificationOptions::default(),
        )
        .await;
    }

    /// Side effects of an accepted approval transition
    pub async fn approval_changed<T: Approvable + Sync>(
        &self,
        item: &T,
        event: &ApprovalEvent,
        actor: &str,
    ) {
        let kind = T::KIND;
        let name = item.display_name();
        let params = HashMap::from([
            ("user".to_string(), actor.to_string()),
            ("name".to_string(), name.clone()),
            ("version".to_string(), item.version().to_string()),
            (
                "comments".to_string(),
                event.comments().unwrap_or_default().to_string(),
            ),
        ]);
        let options = NotificationOptions::related(item.id().to_string(), kind.as_str());
        let link = self.item_link(kind, item.id());

        match event {
            ApprovalEvent::Submit => {
                let approvers = match self.directory.approvers().await {
                    Ok(approvers) => approvers,
                    Err(e) => {
                        self.report_failure(actor, "Loading approvers", &e).await;
                        Vec::new()
                    }
                };
                if approvers.is_empty() {
                    debug!(kind = %kind, id = %item.id(), "No approvers configured");
                }
                for approver in approvers {
                    let message = EmailMessage {
                        to: approver.email.clone(),
                        subject: format!("Approval requested: {} \"{}\"", kind, name),
                        html: submitted_html(kind, &name, actor, &link),
                    };
                    if let Err(e) = self.send_email(message).await {
                        self.report_failure(actor, "Emailing approver", &e).await;
                    }
                }
                self.notify(catalogue_id(kind, event), &params, None, options)
                    .await;
            }
            ApprovalEvent::Approve { .. } | ApprovalEvent::Reject { .. } => {
                let approved = matches!(event, ApprovalEvent::Approve { .. });
                match self.owner(item.owner(), actor).await {
                    Some(owner) => {
                        let message = EmailMessage {
                            to: owner.email,
                            subject: format!(
                                "Your {} \"{}\" was {}",
                                kind,
                                name,
                                if approved { "approved" } else { "rejected" }
                            ),
                            html: decided_html(kind, &name, actor, approved, event.comments(), &link),
                        };
                        if let Err(e) = self.send_email(message).await {
                            self.report_failure(actor, "Emailing owner", &e).await;
                        }
                    }
                    None => debug!(owner = item.owner(), "Owner has no email address"),
                }

                let options = if approved { options } else { options.important() };
                self.notify(
                    catalogue_id(kind, event),
                    &params,
                    Some(item.owner().to_string()),
                    options,
                )
                .await;
            }
        }
    }

    async fn owner(&self, username: &str, actor: &str) -> Option<DirectoryUser> {
        match self.directory.find_by_username(username).await {
            Ok(user) => user,
            Err(e) => {
                self.report_failure(actor, "Looking up owner", &e).await;
                None
            }
        }
    }
}

fn catalogue_id(kind: ItemKind, event: &ApprovalEvent) -> &'static str {
    match (kind, event) {
        (ItemKind::Template, ApprovalEvent::Submit) => notifications::TEMPLATE_SUBMITTED,
        (ItemKind::Template, ApprovalEvent::Approve { .. }) => notifications::TEMPLATE_APPROVED,
        (ItemKind::Template, ApprovalEvent::Reject { .. }) => notifications::TEMPLATE_REJECTED,
        (ItemKind::Contract, ApprovalEvent::Submit) => notifications::CONTRACT_SUBMITTED,
        (ItemKind::Contract, ApprovalEvent::Approve { .. }) => notifications::CONTRACT_APPROVED,
        (ItemKind::Contract, ApprovalEvent::Reject { .. }) => notifications::CONTRACT_REJECTED,
    }
}

/// Minimal escaping for text placed inside email HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn submitted_html(kind: ItemKind, name: &str, actor: &str, link: &str) -> String {
    format!(
        "<p>{} submitted the {} <strong>{}</strong> for approval.</p>\
         <p><a href=\"{}\">Review it</a></p>",
        escape_html(actor),
        kind,
        escape_html(name),
        escape_html(link),
    )
}

fn decided_html(
    kind: ItemKind,
    name: &str,
    actor: &str,
    approved: bool,
    comments: Option<&str>,
    link: &str,
) -> String {
    let verdict = if approved { "approved" } else { "rejected" };
    let comments = comments
        .filter(|c| !c.is_empty())
        .map(|c| format!("<p>Comments: {}</p>", escape_html(c)))
        .unwrap_or_default();
    format!(
        "<p>Your {} <strong>{}</strong> was {} by {}.</p>{}<p><a href=\"{}\">Open it</a></p>",
        kind,
        escape_html(name),
        verdict,
        escape_html(actor),
        comments,
        escape_html(link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::transition;
    use crate::model::{ContractTemplate, TemplateContent};
    use crate::store::MemoryStore;
    use crate::testing::{notifier, RecordingMailer, APPROVER, OWNER};
    use chrono::Utc;

    fn template() -> ContractTemplate {
        ContractTemplate::new(
            TemplateContent {
                name: "Promoter <v2>".into(),
                ..Default::default()
            },
            OWNER,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_submit_emails_approvers() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(&store, &mailer);

        let mut t = template();
        transition(&mut t, &ApprovalEvent::Submit, OWNER, Utc::now()).unwrap();
        notifier.approval_changed(&t, &ApprovalEvent::Submit, OWNER).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, APPROVER);
        assert!(sent[0].html.contains("Promoter &lt;v2&gt;"));
        assert!(sent[0].html.contains("https://app.example.com/templates/"));

        let stored = store.notifications().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].template_id, notifications::TEMPLATE_SUBMITTED);
        assert!(stored[0].recipient.is_none());
    }

    #[tokio::test]
    async fn test_reject_notifies_owner_with_reason() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(&store, &mailer);

        let event = ApprovalEvent::Reject {
            comments: Some("Missing term clause".into()),
        };
        notifier.approval_changed(&template(), &event, APPROVER).await;

        assert_eq!(mailer.sent_to(OWNER), 1);
        let stored = store.notifications().await;
        assert_eq!(stored[0].template_id, notifications::TEMPLATE_REJECTED);
        assert_eq!(stored[0].recipient.as_deref(), Some(OWNER));
        assert!(stored[0].message.contains("Missing term clause"));
        assert!(stored[0].options.important);
    }

    #[tokio::test]
    async fn test_email_failure_becomes_general_error() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::failing_for(&[APPROVER]));
        let notifier = notifier(&store, &mailer);

        notifier
            .approval_changed(&template(), &ApprovalEvent::Submit, OWNER)
            .await;

        let ids: Vec<String> = store
            .notifications()
            .await
            .into_iter()
            .map(|n| n.template_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                notifications::GENERAL_ERROR.to_string(),
                notifications::TEMPLATE_SUBMITTED.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_send_email_surfaces_transport_errors() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::unreachable());
        let notifier = notifier(&store, &mailer);

        let result = notifier
            .send_email(EmailMessage {
                to: APPROVER.into(),
                subject: "s".into(),
                html: "h".into(),
            })
            .await;
        assert!(matches!(result, Err(AppError::MailError { .. })));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
