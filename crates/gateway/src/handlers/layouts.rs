//! Layout generation and document template handlers
//!
//! These endpoints are stateless: they turn contract data into layout
//! documents without persisting anything.

use super::validate;
use axum::{extract::Path, Json};
use pactforge_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    metrics,
};
use pactforge_layout::{
    document_template, fill_template, generate_contract_layout, generate_figma_contract_json,
    template::DOCUMENT_TEMPLATE_NAMES, ContractData, ContractLayoutDocument, DocumentTemplate,
    FigmaContractDocument, MissingFieldPolicy,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

const MAX_FIELD_CHARS: usize = 1000;

/// Contract data as accepted over HTTP
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_contract_data"))]
pub struct ContractDataRequest {
    #[serde(flatten)]
    pub data: ContractData,
}

/// The first party is the only field a contract cannot do without
fn validate_contract_data(request: &ContractDataRequest) -> std::result::Result<(), ValidationError> {
    let data = &request.data;
    if data.first_party_name_en.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("first_party_name_en is required".into());
        return Err(err);
    }

    let oversized = [
        &data.first_party_name_en,
        &data.second_party_name_en,
        &data.promoter_name_en,
        &data.product_name_en,
        &data.location_name_en,
    ]
    .iter()
    .any(|value| value.chars().count() > MAX_FIELD_CHARS);
    if oversized {
        let mut err = ValidationError::new("length");
        err.message = Some(format!("fields are limited to {} characters", MAX_FIELD_CHARS).into());
        return Err(err);
    }
    Ok(())
}

/// Generate a page/section layout (`1.0` or `2.0` depending on `template_type`)
pub async fn generate_layout(
    auth: AuthContext,
    Json(request): Json<ContractDataRequest>,
) -> Result<Json<ContractLayoutDocument>> {
    auth.require_user()?;
    validate(&request)?;

    let document = generate_contract_layout(&request.data);
    metrics::record_layout(document.version());
    Ok(Json(document))
}

/// Generate a Figma-compatible node tree
pub async fn generate_figma(
    auth: AuthContext,
    Json(request): Json<ContractDataRequest>,
) -> Result<Json<FigmaContractDocument>> {
    auth.require_user()?;
    validate(&request)?;

    let document = generate_figma_contract_json(&request.data);
    metrics::record_layout("figma");
    Ok(Json(document))
}

#[derive(Serialize)]
pub struct DocumentTemplateList {
    pub templates: Vec<NamedTemplate>,
}

#[derive(Serialize)]
pub struct NamedTemplate {
    pub name: String,
    pub template: DocumentTemplate,
}

/// Registered document templates with their unfilled placeholders
pub async fn list_document_templates(auth: AuthContext) -> Result<Json<DocumentTemplateList>> {
    auth.require_user()?;

    let templates = DOCUMENT_TEMPLATE_NAMES
        .iter()
        .filter_map(|name| {
            document_template(name).map(|template| NamedTemplate {
                name: name.to_string(),
                template,
            })
        })
        .collect();
    Ok(Json(DocumentTemplateList { templates }))
}

#[derive(Debug, Deserialize)]
pub struct FillRequest {
    pub data: ContractData,
    /// Defaults to erasing tokens whose data is missing
    #[serde(default)]
    pub policy: MissingFieldPolicy,
}

/// Substitute contract data into a named document template
pub async fn fill_document_template(
    auth: AuthContext,
    Path(name): Path<String>,
    Json(request): Json<FillRequest>,
) -> Result<Json<DocumentTemplate>> {
    auth.require_user()?;

    let template =
        document_template(&name).ok_or_else(|| AppError::UnknownDocumentTemplate { name })?;
    let filled = fill_template(&template, &request.data, request.policy)?;
    Ok(Json(filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first_party: &str) -> ContractDataRequest {
        ContractDataRequest {
            data: ContractData {
                first_party_name_en: first_party.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_first_party_required() {
        assert!(validate(&request("Acme LLC")).is_ok());
        assert!(matches!(
            validate(&request("  ")),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_oversized_field_rejected() {
        let mut oversized = request("Acme LLC");
        oversized.data.location_name_en = "x".repeat(MAX_FIELD_CHARS + 1);
        assert!(validate(&oversized).is_err());
    }

    #[test]
    fn test_fill_request_defaults_policy() {
        let request: FillRequest =
            serde_json::from_str(r#"{"data": {"first_party_name_en": "Acme"}}"#).unwrap();
        assert_eq!(request.policy, MissingFieldPolicy::EmptyString);
        assert_eq!(request.data.first_party_name_en, "Acme");
    }
}
