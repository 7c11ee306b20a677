//! Contract template handlers: versions, comparison and approvals

use super::{validate, DecisionRequest, StatusQuery};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pactforge_common::{
    auth::AuthContext,
    errors::{AppError, Result},
};
use pactforge_workflow::{
    ActivityEntry, ContractTemplate, TemplateContent, TemplateDiff, TemplateEdit, TemplateVersion,
    VersionRef,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,

    #[validate(length(min = 1, max = 100))]
    pub contract_type: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub responsibilities: Vec<String>,

    #[validate(range(min = 1, max = 3650))]
    pub default_duration: Option<u32>,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
}

impl From<CreateTemplateRequest> for TemplateContent {
    fn from(request: CreateTemplateRequest) -> Self {
        TemplateContent {
            name: request.name,
            description: request.description,
            contract_type: request.contract_type,
            responsibilities: request.responsibilities,
            default_duration: request.default_duration,
            category: request.category,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[serde(flatten)]
    pub edit: TemplateEdit,

    #[serde(default)]
    #[validate(length(max = 1000))]
    pub change_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub from: String,
    pub to: String,
}

fn version_ref(raw: &str, field: &str) -> Result<VersionRef> {
    VersionRef::parse(raw).ok_or_else(|| AppError::Validation {
        message: format!("'{}' is neither 'current' nor a version id", raw),
        field: Some(field.to_string()),
    })
}

pub async fn create_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ContractTemplate>)> {
    let username = auth.username()?;
    validate(&request)?;

    let template = state
        .workflow
        .templates
        .create(request.into(), &username)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn list_templates(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ContractTemplate>>> {
    auth.require_user()?;
    let templates = state.workflow.templates.list(query.parse()?).await?;
    Ok(Json(templates))
}

pub async fn get_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractTemplate>> {
    auth.require_user()?;
    Ok(Json(state.workflow.templates.get(id).await?))
}

/// Edit content; the previous state becomes a history snapshot
pub async fn update_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<ContractTemplate>> {
    let username = auth.username()?;
    validate(&request)?;

    let notes = request.change_notes.unwrap_or_default();
    let template = state
        .workflow
        .templates
        .edit(id, request.edit, &notes, &username)
        .await?;
    Ok(Json(template))
}

pub async fn list_versions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TemplateVersion>>> {
    auth.require_user()?;
    Ok(Json(state.workflow.templates.versions(id).await?))
}

/// `?from=<version id|current>&to=<version id|current>`
pub async fn compare_versions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<TemplateDiff>> {
    auth.require_user()?;
    let from = version_ref(&query.from, "from")?;
    let to = version_ref(&query.to, "to")?;
    Ok(Json(state.workflow.templates.compare(id, from, to).await?))
}

pub async fn restore_version(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ContractTemplate>> {
    let username = auth.username()?;
    let template = state
        .workflow
        .templates
        .restore(id, version_id, &username)
        .await?;
    Ok(Json(template))
}

pub async fn submit_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractTemplate>> {
    let username = auth.username()?;
    Ok(Json(state.workflow.templates.submit(id, &username).await?))
}

pub async fn approve_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ContractTemplate>> {
    let username = auth.require_approver("approve templates")?.email.clone();
    validate(&request)?;
    let template = state
        .workflow
        .templates
        .approve(id, request.comments, &username)
        .await?;
    Ok(Json(template))
}

pub async fn reject_template(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ContractTemplate>> {
    let username = auth.require_approver("reject templates")?.email.clone();
    validate(&request)?;
    let template = state
        .workflow
        .templates
        .reject(id, request.comments, &username)
        .await?;
    Ok(Json(template))
}

pub async fn template_activity(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>> {
    auth.require_user()?;
    Ok(Json(state.workflow.templates.activity(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let request: CreateTemplateRequest = serde_json::from_str(
            r#"{"name": "Promoter NDA", "contractType": "nda", "defaultDuration": 90}"#,
        )
        .unwrap();
        assert!(validate(&request).is_ok());

        let content = TemplateContent::from(request);
        assert_eq!(content.default_duration, Some(90));
        assert!(content.responsibilities.is_empty());

        let empty: CreateTemplateRequest =
            serde_json::from_str(r#"{"name": "", "contractType": "nda"}"#).unwrap();
        assert!(validate(&empty).is_err());

        let zero_duration: CreateTemplateRequest = serde_json::from_str(
            r#"{"name": "NDA", "contractType": "nda", "defaultDuration": 0}"#,
        )
        .unwrap();
        assert!(validate(&zero_duration).is_err());
    }

    #[test]
    fn test_update_request_flattens_edit() {
        let request: UpdateTemplateRequest = serde_json::from_str(
            r#"{"description": "Updated", "changeNotes": "Clarified scope"}"#,
        )
        .unwrap();
        assert_eq!(request.edit.description.as_deref(), Some("Updated"));
        assert!(request.edit.name.is_none());
        assert_eq!(request.change_notes.as_deref(), Some("Clarified scope"));
    }

    #[test]
    fn test_version_ref_parsing() {
        assert!(matches!(version_ref("current", "from"), Ok(VersionRef::Current)));
        assert!(matches!(
            version_ref("v3", "to"),
            Err(AppError::Validation { field: Some(f), .. }) if f == "to"
        ));
    }
}
