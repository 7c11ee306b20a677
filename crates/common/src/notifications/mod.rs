//! In-app notification templates
//!
//! Notifications are created from a fixed catalogue. Titles and messages
//! carry `{param}` slots; a slot with no matching parameter is left as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const TEMPLATE_SUBMITTED: &str = "template-submitted";
pub const TEMPLATE_APPROVED: &str = "template-approved";
pub const TEMPLATE_REJECTED: &str = "template-rejected";
pub const CONTRACT_SUBMITTED: &str = "contract-submitted";
pub const CONTRACT_APPROVED: &str = "contract-approved";
pub const CONTRACT_REJECTED: &str = "contract-rejected";
pub const APPROVAL_REMINDER: &str = "approval-reminder";
pub const GENERAL_ERROR: &str = "general-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub message: &'static str,
}

const CATALOGUE: &[NotificationTemplate] = &[
    NotificationTemplate {
        id: TEMPLATE_SUBMITTED,
        title: "Template submitted for approval",
        message: "{user} submitted template \"{name}\" (version {version}) for approval.",
    },
    NotificationTemplate {
        id: TEMPLATE_APPROVED,
        title: "Template approved",
        message: "Template \"{name}\" was approved by {user}. {comments}",
    },
    NotificationTemplate {
        id: TEMPLATE_REJECTED,
        title: "Template rejected",
        message: "Template \"{name}\" was rejected by {user}. Reason: {comments}",
    },
    NotificationTemplate {
        id: CONTRACT_SUBMITTED,
        title: "Contract submitted for approval",
        message: "{user} submitted contract {name} for approval.",
    },
    NotificationTemplate {
        id: CONTRACT_APPROVED,
        title: "Contract approved",
        message: "Contract {name} was approved by {user}. {comments}",
    },
    NotificationTemplate {
        id: CONTRACT_REJECTED,
        title: "Contract rejected",
        message: "Contract {name} was rejected by {user}. Reason: {comments}",
    },
    NotificationTemplate {
        id: APPROVAL_REMINDER,
        title: "Approvals waiting",
        message: "{count} item(s) are waiting for your approval.",
    },
    NotificationTemplate {
        id: GENERAL_ERROR,
        title: "Something went wrong",
        message: "{message}",
    },
];

pub fn catalogue() -> &'static [NotificationTemplate] {
    CATALOGUE
}

pub fn find_template(id: &str) -> Option<&'static NotificationTemplate> {
    CATALOGUE.iter().find(|t| t.id == id)
}

/// Delivery options attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub requires_read_receipt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_item_type: Option<String>,
}

impl NotificationOptions {
    pub fn related(item_id: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            related_item_id: Some(item_id.into()),
            related_item_type: Some(item_type.into()),
            ..Default::default()
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

/// A notification ready to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub template_id: String,
    /// `None` broadcasts to every user allowed to see the related item
    pub recipient: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
    pub created_at: DateTime<Utc>,
}

/// Replace `{key}` slots from `params`
pub fn expand_text(text: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match params.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Build a notification from a catalogue entry; `None` for unknown ids
pub fn expand(
    template_id: &str,
    params: &HashMap<String, String>,
    recipient: Option<String>,
    options: NotificationOptions,
) -> Option<Notification> {
    let template = find_template(template_id)?;
    Some(Notification {
        id: Uuid::new_v4(),
        template_id: template.id.to_string(),
        recipient,
        title: expand_text(template.title, params),
        message: expand_text(template.message, params).trim_end().to_string(),
        options,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_catalogue_ids_are_unique() {
        let mut ids: Vec<_> = catalogue().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalogue().len());
    }

    #[test]
    fn test_expand_fills_params() {
        let n = expand(
            TEMPLATE_REJECTED,
            &params(&[("name", "NDA"), ("user", "boss"), ("comments", "too vague")]),
            Some("alice@example.com".into()),
            NotificationOptions::related("t1", "template").important(),
        )
        .unwrap();

        assert_eq!(n.message, "Template \"NDA\" was rejected by boss. Reason: too vague");
        assert!(n.options.important);
        assert_eq!(n.options.related_item_type.as_deref(), Some("template"));
    }

    #[test]
    fn test_unknown_params_stay_literal() {
        assert_eq!(expand_text("{count} of {total}", &params(&[("count", "2")])), "2 of {total}");
        assert_eq!(expand_text("open {brace", &HashMap::new()), "open {brace");
    }

    #[test]
    fn test_unknown_template() {
        assert!(expand("nope", &HashMap::new(), None, NotificationOptions::default()).is_none());
    }
}
