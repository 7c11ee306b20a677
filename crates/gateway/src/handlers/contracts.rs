//! Contract handlers: generation, lookup and approvals

use super::{layouts::ContractDataRequest, validate, DecisionRequest, StatusQuery};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pactforge_common::{auth::AuthContext, errors::Result};
use pactforge_workflow::{ActivityEntry, ContractRecord};
use uuid::Uuid;

/// Generate a layout and persist it as a draft contract
pub async fn create_contract(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<ContractDataRequest>,
) -> Result<(StatusCode, Json<ContractRecord>)> {
    let username = auth.username()?;
    validate(&request)?;

    let contract = state
        .workflow
        .contracts
        .generate(request.data, &username)
        .await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ContractRecord>>> {
    auth.require_user()?;
    Ok(Json(state.workflow.contracts.list(query.parse()?).await?))
}

pub async fn get_contract(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractRecord>> {
    auth.require_user()?;
    Ok(Json(state.workflow.contracts.get(id).await?))
}

pub async fn submit_contract(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractRecord>> {
    let username = auth.username()?;
    Ok(Json(state.workflow.contracts.submit(id, &username).await?))
}

pub async fn approve_contract(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ContractRecord>> {
    let username = auth.require_approver("approve contracts")?.email.clone();
    validate(&request)?;
    let contract = state
        .workflow
        .contracts
        .approve(id, request.comments, &username)
        .await?;
    Ok(Json(contract))
}

pub async fn reject_contract(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ContractRecord>> {
    let username = auth.require_approver("reject contracts")?.email.clone();
    validate(&request)?;
    let contract = state
        .workflow
        .contracts
        .reject(id, request.comments, &username)
        .await?;
    Ok(Json(contract))
}

pub async fn contract_activity(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>> {
    auth.require_user()?;
    Ok(Json(state.workflow.contracts.activity(id).await?))
}
