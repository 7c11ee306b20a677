//! Outbound email
//!
//! `Mailer` is the only seam through which the workflow reaches an email
//! provider. Transport failures are errors; a provider that accepts the
//! request but refuses the message yields an unsuccessful `EmailReceipt`.

use crate::config::{MailConfig, MailProvider};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outcome reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmailReceipt {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    /// Collapse an unsuccessful receipt into an error
    pub fn into_result(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::MailError {
                message: self.error.unwrap_or_else(|| "rejected by provider".to_string()),
            })
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt>;

    fn provider_name(&self) -> &str;
}

/// Transactional email API client (`POST {api_base}/emails`)
pub struct HttpMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from_address: String,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let api_base = config.api_base.clone().ok_or_else(|| AppError::Configuration {
            message: "mail.api_base is required for the http provider".to_string(),
        })?;
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "mail.api_key is required for the http provider".to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            from_address: config.from_address.clone(),
            timeout_ms: config.timeout_secs * 1000,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt> {
        let url = format!("{}/emails", self.api_base);
        let body = SendRequest {
            from: &self.from_address,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::MailTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    AppError::MailError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(to = %message.to, status = status.as_u16(), "Email rejected by provider");
            return Ok(EmailReceipt::failed(format!("API error {}: {}", status, body)));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(EmailReceipt::delivered())
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

/// Writes messages to the log instead of delivering them
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "Email (log provider)"
        );
        Ok(EmailReceipt::delivered())
    }

    fn provider_name(&self) -> &str {
        "log"
    }
}

/// Create a mailer based on configuration
pub fn create_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    match config.provider {
        MailProvider::Http => Ok(Arc::new(HttpMailer::new(config)?)),
        MailProvider::Log => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_delivers() {
        let mailer = LogMailer;
        let receipt = mailer
            .send_email(EmailMessage {
                to: "a@example.com".into(),
                subject: "Hi".into(),
                html: "<p>Hi</p>".into(),
            })
            .await
            .unwrap();
        assert!(receipt.success);
        assert!(receipt.into_result().is_ok());
    }

    #[test]
    fn test_failed_receipt_into_error() {
        let err = EmailReceipt::failed("bounced").into_result().unwrap_err();
        assert!(matches!(err, AppError::MailError { message } if message == "bounced"));
    }

    #[test]
    fn test_http_mailer_requires_credentials() {
        let config = MailConfig {
            provider: MailProvider::Http,
            ..MailConfig::default()
        };
        assert!(matches!(
            create_mailer(&config),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_factory_builds_log_mailer() {
        let mailer = create_mailer(&MailConfig::default()).unwrap();
        assert_eq!(mailer.provider_name(), "log");
    }
}
