//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - The `AuthContext` extractor with role checks
//! - A user directory for resolving approvers and item owners

use crate::config::ApprovalsConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Admins and managers decide on pending approvals
    pub fn can_approve(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: Option<CurrentUser>,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Admins implicitly hold every role
    pub fn has_role(&self, role: Role) -> bool {
        self.user
            .as_ref()
            .map(|u| u.role == role || u.role == Role::Admin)
            .unwrap_or(false)
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// The authenticated user, or 401
    pub fn require_user(&self) -> Result<&CurrentUser> {
        self.user.as_ref().ok_or_else(|| AppError::Unauthorized {
            message: "Authentication required".to_string(),
        })
    }

    /// Username recorded on audit fields (`createdBy`, `approvedBy`, ...)
    pub fn username(&self) -> Result<String> {
        self.require_user().map(|u| u.email.clone())
    }

    pub fn require_approver(&self, action: &str) -> Result<&CurrentUser> {
        let user = self.require_user()?;
        if user.role.can_approve() {
            Ok(user)
        } else {
            Err(AppError::InsufficientPermissions {
                role: user.role.to_string(),
                action: action.to_string(),
            })
        }
    }

    pub fn require_admin(&self, action: &str) -> Result<&CurrentUser> {
        let user = self.require_user()?;
        if user.role == Role::Admin {
            Ok(user)
        } else {
            Err(AppError::InsufficientPermissions {
                role: user.role.to_string(),
                action: action.to_string(),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    pub role: Role,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    pub fn generate_token(&self, user_id: &str, email: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid bearer token".to_string(),
                },
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Anonymous requests get a context without a user; handlers decide
/// whether that is acceptable.
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer);

        let user = match token {
            Some(token) => {
                let jwt = Arc::<JwtManager>::from_ref(state);
                let claims = jwt.validate_token(token)?;
                Some(CurrentUser {
                    id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                })
            }
            None => None,
        };

        Ok(AuthContext { user, request_id })
    }
}

/// A known person who can receive email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub username: String,
    pub email: String,
}

/// Resolves approvers and item owners to mail recipients
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn approvers(&self) -> Result<Vec<DirectoryUser>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<DirectoryUser>>;
}

/// Directory backed by configuration: approvers are listed explicitly and
/// usernames are email addresses.
pub struct ConfigDirectory {
    approvers: Vec<DirectoryUser>,
}

impl ConfigDirectory {
    pub fn new(config: &ApprovalsConfig) -> Self {
        Self::from_emails(config.approver_emails.iter().cloned())
    }

    pub fn from_emails(emails: impl IntoIterator<Item = String>) -> Self {
        let approvers = emails
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .map(|email| DirectoryUser {
                username: email.clone(),
                email,
            })
            .collect();
        Self { approvers }
    }
}

#[async_trait]
impl UserDirectory for ConfigDirectory {
    async fn approvers(&self) -> Result<Vec<DirectoryUser>> {
        Ok(self.approvers.clone())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<DirectoryUser>> {
        if username.contains('@') {
            Ok(Some(DirectoryUser {
                username: username.to_string(),
                email: username.to_string(),
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Option<Role>) -> AuthContext {
        AuthContext {
            user: role.map(|role| CurrentUser {
                id: "u1".into(),
                email: "alice@example.com".into(),
                role,
            }),
            request_id: "req".into(),
        }
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let token = manager
            .generate_token("u1", "alice@example.com", Role::Manager)
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);
        let token = other.generate_token("u1", "a@b.c", Role::User).unwrap();
        assert!(matches!(
            manager.validate_token(&token),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_role_checks() {
        assert!(!context(None).is_authenticated());
        assert!(context(Some(Role::Admin)).has_role(Role::Manager));
        assert!(!context(Some(Role::User)).has_role(Role::Manager));

        assert!(context(Some(Role::Manager)).require_approver("approve").is_ok());
        assert!(matches!(
            context(Some(Role::User)).require_approver("approve"),
            Err(AppError::InsufficientPermissions { .. })
        ));
        assert!(matches!(
            context(None).username(),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_config_directory() {
        let directory = ConfigDirectory::from_emails(vec![
            "boss@example.com".to_string(),
            " ".to_string(),
        ]);
        assert_eq!(directory.approvers().await.unwrap().len(), 1);
        assert!(directory.find_by_username("alice@example.com").await.unwrap().is_some());
        assert!(directory.find_by_username("alice").await.unwrap().is_none());
    }
}
