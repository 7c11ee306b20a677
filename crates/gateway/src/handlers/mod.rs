//! API handlers module

pub mod contracts;
pub mod health;
pub mod layouts;
pub mod reminders;
pub mod templates;

use pactforge_common::{errors::Result, AppError, ApprovalStatus};
use serde::Deserialize;
use validator::Validate;

/// Run `validator` rules on a request body
pub fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// `?status=` filter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn parse(&self) -> Result<Option<ApprovalStatus>> {
        match self.status.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => ApprovalStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::Validation {
                    message: format!("Unknown approval status '{}'", raw),
                    field: Some("status".to_string()),
                }),
        }
    }
}

/// Optional approver comments on approve/reject
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DecisionRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}
