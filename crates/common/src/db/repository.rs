//! Repository pattern for database operations
//!
//! Row-level access for templates, their version history, contracts,
//! activity logs, notifications and reminder cadence claims. Template and
//! contract writes are compare-and-swap on the `version` column; cadence
//! claims are compare-and-swap on `last_sent`.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

/// Filter for items waiting on an approver
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingFilter {
    /// Only items whose approval was requested before this instant
    pub requested_before: Option<DateTime<Utc>>,
    /// Only items never reminded, or last reminded before this instant
    pub reminded_before: Option<DateTime<Utc>>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Template Operations
    // ========================================================================

    pub async fn find_template(&self, id: Uuid) -> Result<Option<TemplateRow>> {
        TemplateEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_templates(&self, status: Option<ApprovalStatus>) -> Result<Vec<TemplateRow>> {
        let mut query = TemplateEntity::find().order_by_desc(TemplateColumn::UpdatedAt);
        if let Some(status) = status {
            query = query.filter(TemplateColumn::ApprovalStatus.eq(status.as_str()));
        }
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// History rows ordered oldest first
    pub async fn find_template_versions(&self, template_id: Uuid) -> Result<Vec<TemplateVersionRow>> {
        TemplateVersionEntity::find()
            .filter(TemplateVersionColumn::TemplateId.eq(template_id))
            .order_by_asc(TemplateVersionColumn::Version)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn insert_template(&self, row: TemplateRow) -> Result<TemplateRow> {
        row.into_active_model()
            .reset_all()
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }

    /// Overwrite the template row if its stored version and approval status
    /// are still the expected ones, appending `new_versions` in the same
    /// transaction.
    pub async fn update_template_if_version(
        &self,
        row: TemplateRow,
        expected_version: i32,
        expected_status: ApprovalStatus,
        new_versions: Vec<TemplateVersionRow>,
    ) -> Result<()> {
        let id = row.id;
        let txn = self.write_conn().begin().await?;

        let result = TemplateEntity::update_many()
            .set(row.into_active_model().reset_all())
            .filter(TemplateColumn::Id.eq(id))
            .filter(TemplateColumn::Version.eq(expected_version))
            .filter(TemplateColumn::ApprovalStatus.eq(expected_status.as_str()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            let found = TemplateEntity::find_by_id(id)
                .one(self.write_conn())
                .await?
                .ok_or_else(|| AppError::TemplateNotFound { id: id.to_string() })?
                .version;
            return Err(AppError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                found,
            });
        }

        if !new_versions.is_empty() {
            TemplateVersionEntity::insert_many(
                new_versions
                    .into_iter()
                    .map(|v| v.into_active_model().reset_all()),
            )
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn pending_templates(&self, filter: PendingFilter) -> Result<Vec<TemplateRow>> {
        let query = TemplateEntity::find()
            .filter(TemplateColumn::ApprovalStatus.eq(ApprovalStatus::PendingApproval.as_str()))
            .order_by_asc(TemplateColumn::ApprovalRequestedAt);

        pending(
            query,
            filter,
            TemplateColumn::ApprovalRequestedAt,
            TemplateColumn::LastReminderSent,
        )
        .all(self.read_conn())
        .await
        .map_err(Into::into)
    }

    /// Stamp `last_reminder_sent` without touching the version counter
    pub async fn mark_template_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let result = TemplateEntity::update_many()
            .col_expr(TemplateColumn::LastReminderSent, sea_orm::sea_query::Expr::value(at))
            .filter(TemplateColumn::Id.eq(id))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::TemplateNotFound { id: id.to_string() });
        }
        Ok(())
    }

    // ========================================================================
    // Contract Operations
    // ========================================================================

    pub async fn find_contract(&self, id: Uuid) -> Result<Option<ContractRow>> {
        ContractEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_contracts(&self, status: Option<ApprovalStatus>) -> Result<Vec<ContractRow>> {
        let mut query = ContractEntity::find().order_by_desc(ContractColumn::CreatedAt);
        if let Some(status) = status {
            query = query.filter(ContractColumn::ApprovalStatus.eq(status.as_str()));
        }
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn insert_contract(&self, row: ContractRow) -> Result<ContractRow> {
        row.into_active_model()
            .reset_all()
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn update_contract_if_version(&self, row: ContractRow, expected_version: i32) -> Result<()> {
        let id = row.id;
        let result = ContractEntity::update_many()
            .set(row.into_active_model().reset_all())
            .filter(ContractColumn::Id.eq(id))
            .filter(ContractColumn::Version.eq(expected_version))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            let found = ContractEntity::find_by_id(id)
                .one(self.write_conn())
                .await?
                .ok_or_else(|| AppError::ContractNotFound { id: id.to_string() })?
                .version;
            return Err(AppError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                found,
            });
        }
        Ok(())
    }

    pub async fn pending_contracts(&self, filter: PendingFilter) -> Result<Vec<ContractRow>> {
        let query = ContractEntity::find()
            .filter(ContractColumn::ApprovalStatus.eq(ApprovalStatus::PendingApproval.as_str()))
            .order_by_asc(ContractColumn::ApprovalRequestedAt);

        pending(
            query,
            filter,
            ContractColumn::ApprovalRequestedAt,
            ContractColumn::LastReminderSent,
        )
        .all(self.read_conn())
        .await
        .map_err(Into::into)
    }

    pub async fn mark_contract_reminded(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let result = ContractEntity::update_many()
            .col_expr(ContractColumn::LastReminderSent, sea_orm::sea_query::Expr::value(at))
            .filter(ContractColumn::Id.eq(id))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::ContractNotFound { id: id.to_string() });
        }
        Ok(())
    }

    // ========================================================================
    // Activity & Notification Operations
    // ========================================================================

    pub async fn insert_activity(&self, row: ActivityLogRow) -> Result<()> {
        ActivityLogEntity::insert(row.into_active_model().reset_all())
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    /// Entries for one item, newest first
    pub async fn list_activity(&self, item_id: Uuid) -> Result<Vec<ActivityLogRow>> {
        ActivityLogEntity::find()
            .filter(ActivityLogColumn::ItemId.eq(item_id))
            .order_by_desc(ActivityLogColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn insert_notification(&self, row: NotificationRow) -> Result<()> {
        let mut active = row.into_active_model().reset_all();
        active.read_at = Set(None);
        NotificationEntity::insert(active)
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    // ========================================================================
    // Scheduler Operations
    // ========================================================================

    /// Take the `cadence` slot at `now` if it was never sent or last sent at
    /// or before `not_after`. Returns false when another process holds it.
    pub async fn claim_cadence(
        &self,
        cadence: &str,
        not_after: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let seed = SchedulerClaimRow {
            cadence: cadence.to_string(),
            last_sent: None,
        };
        SchedulerClaimEntity::insert(seed.into_active_model().reset_all())
            .on_conflict(
                OnConflict::column(SchedulerClaimColumn::Cadence)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.write_conn())
            .await?;

        let result = SchedulerClaimEntity::update_many()
            .col_expr(SchedulerClaimColumn::LastSent, sea_orm::sea_query::Expr::value(now))
            .filter(SchedulerClaimColumn::Cadence.eq(cadence))
            .filter(
                Condition::any()
                    .add(SchedulerClaimColumn::LastSent.is_null())
                    .add(SchedulerClaimColumn::LastSent.lte(not_after)),
            )
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn list_cadence_claims(&self) -> Result<Vec<SchedulerClaimRow>> {
        SchedulerClaimEntity::find()
            .all(self.write_conn())
            .await
            .map_err(Into::into)
    }
}

fn pending<E, C>(query: Select<E>, filter: PendingFilter, requested_at: C, reminded_at: C) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait + Copy,
{
    let mut query = query;
    if let Some(before) = filter.requested_before {
        query = query.filter(requested_at.lt(before));
    }
    if let Some(before) = filter.reminded_before {
        query = query.filter(
            Condition::any()
                .add(reminded_at.is_null())
                .add(reminded_at.lt(before)),
        );
    }
    query
}
