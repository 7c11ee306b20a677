//! PactForge Common Library
//!
//! Shared code for the PactForge services:
//! - Database models and the repository facade
//! - Error types and HTTP mapping
//! - Configuration management
//! - Authentication context and user directory
//! - Outbound email and the in-app notification catalogue
//! - Metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod mail;
pub mod metrics;
pub mod notifications;

pub use config::AppConfig;
pub use db::{models::ApprovalStatus, DbPool, Repository};
pub use errors::{AppError, Result};
pub use mail::{EmailMessage, EmailReceipt, Mailer};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
