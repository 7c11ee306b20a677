//! Manual trigger for the reminder scheduler

use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use pactforge_common::{auth::AuthContext, errors::Result};
use pactforge_workflow::TickReport;
use tracing::info;

/// Run one scheduler tick now. Cadence slots already claimed by any
/// scheduler on the same storage are not re-sent; escalation always runs.
pub async fn run_reminders(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<TickReport>> {
    let admin = auth.require_admin("run reminders")?;
    info!(user = %admin.email, "Manual reminder run");

    let report = state.workflow.reminders.tick(Utc::now()).await?;
    Ok(Json(report))
}
