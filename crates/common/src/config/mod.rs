//! Configuration management for PactForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Outbound email delivery
    #[serde(default)]
    pub mail: MailConfig,

    /// Who approves templates and contracts
    #[serde(default)]
    pub approvals: ApprovalsConfig,

    /// Reminder scheduler cadence and escalation thresholds
    #[serde(default)]
    pub reminders: ReminderConfig,

    pub auth: AuthConfig,

    pub observability: ObservabilityConfig,

    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// JSON POST to a transactional email API
    Http,
    /// Write messages to the log only
    Log,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_provider")]
    pub provider: MailProvider,

    /// Base URL of the email API (`{api_base}/emails`)
    pub api_base: Option<String>,

    pub api_key: Option<String>,

    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Per-send timeout in seconds
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApprovalsConfig {
    /// Recipients of submission and reminder emails
    #[serde(default)]
    pub approver_emails: Vec<String>,

    /// Used to build links inside emails
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    /// How often the worker wakes up
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Pending items older than this are escalated
    #[serde(default = "default_escalation_after_days")]
    pub escalation_after_days: i64,

    /// Minimum gap between two escalations of the same item
    #[serde(default = "default_resend_after_days")]
    pub resend_after_days: i64,

    /// Upper bound on the work done for one item
    #[serde(default = "default_item_timeout")]
    pub item_timeout_secs: u64,

    #[serde(default = "default_enabled")]
    pub daily_enabled: bool,

    #[serde(default = "default_enabled")]
    pub weekly_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token verification
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,

    /// Request ID header name
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    #[serde(default = "default_burst")]
    pub burst: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_body_bytes() -> usize { 1024 * 1024 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_mail_provider() -> MailProvider { MailProvider::Log }
fn default_from_address() -> String { "no-reply@pactforge.app".to_string() }
fn default_mail_timeout() -> u64 { 10 }
fn default_app_base_url() -> String { "http://localhost:3000".to_string() }
fn default_tick_interval() -> u64 { 3600 }
fn default_escalation_after_days() -> i64 { 7 }
fn default_resend_after_days() -> i64 { 3 }
fn default_item_timeout() -> u64 { 30 }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_request_id_header() -> String { "X-Request-ID".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "pactforge".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. APP__REMINDERS__TICK_INTERVAL_SECS=60
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("approvals.approver_emails")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("APP").separator("__").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ReminderConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: default_mail_provider(),
            api_base: None,
            api_key: None,
            from_address: default_from_address(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

impl Default for ApprovalsConfig {
    fn default() -> Self {
        Self {
            approver_emails: Vec::new(),
            app_base_url: default_app_base_url(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            escalation_after_days: default_escalation_after_days(),
            resend_after_days: default_resend_after_days(),
            item_timeout_secs: default_item_timeout(),
            daily_enabled: default_enabled(),
            weekly_enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
                max_body_bytes: default_max_body_bytes(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/pactforge".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            mail: MailConfig::default(),
            approvals: ApprovalsConfig::default(),
            reminders: ReminderConfig::default(),
            auth: AuthConfig {
                jwt_secret: None,
                jwt_expiration_secs: default_jwt_expiration(),
                request_id_header: default_request_id_header(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: default_rate_limit(),
                burst: default_burst(),
                enabled: default_enabled(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.mail.provider, MailProvider::Log);
        assert_eq!(config.reminders.tick_interval(), Duration::from_secs(3600));
        assert_eq!(config.reminders.escalation_after_days, 7);
        assert_eq!(config.reminders.resend_after_days, 3);
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/pactforge");
    }

    #[test]
    fn test_mail_provider_wire_names() {
        let provider: MailProvider = serde_json::from_str("\"http\"").unwrap();
        assert_eq!(provider, MailProvider::Http);
    }
}
