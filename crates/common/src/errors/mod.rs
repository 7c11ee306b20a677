//! Error types for PactForge services
//!
//! Every failure surfaced over HTTP carries a machine-readable `ErrorCode`
//! grouped by family (the thousands digit) plus a status code mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidFormat,
    UnknownDocumentTemplate,

    // Authentication errors (2xxx)
    Unauthorized,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,
    InsufficientPermissions,

    // Resource errors (4xxx)
    NotFound,
    TemplateNotFound,
    ContractNotFound,
    VersionNotFound,

    // Conflict errors (5xxx)
    Conflict,
    InvalidTransition,
    VersionConflict,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    UpstreamError,
    MailError,
    MailTimeout,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,

    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidFormat => 1003,
            ErrorCode::UnknownDocumentTemplate => 1004,

            ErrorCode::Unauthorized => 2001,
            ErrorCode::ExpiredToken => 2002,

            ErrorCode::Forbidden => 3001,
            ErrorCode::InsufficientPermissions => 3002,

            ErrorCode::NotFound => 4001,
            ErrorCode::TemplateNotFound => 4002,
            ErrorCode::ContractNotFound => 4003,
            ErrorCode::VersionNotFound => 4004,

            ErrorCode::Conflict => 5001,
            ErrorCode::InvalidTransition => 5002,
            ErrorCode::VersionConflict => 5003,

            ErrorCode::RateLimited => 6001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::MailError => 8002,
            ErrorCode::MailTimeout => 8003,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Unknown document template: {name}")]
    UnknownDocumentTemplate { name: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Role {role} may not {action}")]
    InsufficientPermissions { role: String, action: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("Contract not found: {id}")]
    ContractNotFound { id: String },

    #[error("Version {version_id} not found in history of template {template_id}")]
    VersionNotFound {
        template_id: String,
        version_id: String,
    },

    // Conflict errors
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Cannot {attempted} a {kind} in status {from}")]
    InvalidTransition {
        kind: String,
        from: String,
        attempted: String,
    },

    #[error("Version conflict on {id}: expected version {expected}, found {found}")]
    VersionConflict { id: String, expected: i32, found: i32 },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Mail delivery failed: {message}")]
    MailError { message: String },

    #[error("Mail delivery timed out after {timeout_ms}ms")]
    MailTimeout { timeout_ms: u64 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::UnknownDocumentTemplate { .. } => ErrorCode::UnknownDocumentTemplate,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::InsufficientPermissions { .. } => ErrorCode::InsufficientPermissions,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::TemplateNotFound { .. } => ErrorCode::TemplateNotFound,
            AppError::ContractNotFound { .. } => ErrorCode::ContractNotFound,
            AppError::VersionNotFound { .. } => ErrorCode::VersionNotFound,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::VersionConflict { .. } => ErrorCode::VersionConflict,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::MailError { .. } => ErrorCode::MailError,
            AppError::MailTimeout { .. } => ErrorCode::MailTimeout,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::MissingField { .. }
            | AppError::InvalidFormat { .. }
            | AppError::UnknownDocumentTemplate { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden { .. } | AppError::InsufficientPermissions { .. } => {
                StatusCode::FORBIDDEN
            }

            // 404 Not Found
            AppError::NotFound { .. }
            | AppError::TemplateNotFound { .. }
            | AppError::ContractNotFound { .. }
            | AppError::VersionNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict { .. }
            | AppError::InvalidTransition { .. }
            | AppError::VersionConflict { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::MailError { .. } | AppError::MailTimeout { .. } | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Optimistic-concurrency failures are worth retrying against fresh state
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, AppError::VersionConflict { .. })
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            AppError::InvalidTransition {
                kind,
                from,
                attempted,
            } => Some(serde_json::json!({
                "kind": kind,
                "from": from,
                "attempted": attempted,
            })),
            AppError::VersionConflict {
                expected, found, ..
            } => Some(serde_json::json!({ "expected": expected, "found": found })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: self.details(),
                request_id: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<pactforge_layout::LayoutError> for AppError {
    fn from(err: pactforge_layout::LayoutError) -> Self {
        match err {
            pactforge_layout::LayoutError::MissingField { field } => AppError::MissingField { field },
            pactforge_layout::LayoutError::UnknownTemplate { name } => {
                AppError::UnknownDocumentTemplate { name }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::TemplateNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::TemplateNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code().as_code(), 4002);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = AppError::InvalidTransition {
            kind: "template".into(),
            from: "draft".into(),
            attempted: "approve".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Cannot approve a template in status draft");
        assert_eq!(err.details().unwrap()["from"], "draft");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_version_conflict_is_retryable() {
        let err = AppError::VersionConflict {
            id: "t1".into(),
            expected: 2,
            found: 3,
        };
        assert!(err.is_version_conflict());
        assert!(!AppError::ExpiredToken.is_version_conflict());
    }

    #[test]
    fn test_layout_error_conversion() {
        let err: AppError = pactforge_layout::LayoutError::MissingField {
            field: "PROMOTER_ID".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::MissingField);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_error() {
        let err = AppError::MailError {
            message: "smtp relay down".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
    }
}
