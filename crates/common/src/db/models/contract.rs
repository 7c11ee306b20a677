//! Contract entity: generated contract with its persisted layout

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub ref_number: String,

    /// Contract data exactly as submitted
    #[sea_orm(column_type = "JsonBinary")]
    pub contract_data: Json,

    /// Generated layout document (v1.0 or v2.0), served verbatim
    #[sea_orm(column_type = "JsonBinary")]
    pub layout: Json,

    #[sea_orm(column_type = "Text")]
    pub layout_version: String,

    #[sea_orm(column_type = "Text")]
    pub approval_status: String,

    /// Optimistic concurrency counter
    pub version: i32,

    pub approval_requested_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub approval_requested_by: Option<String>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub approved_by: Option<String>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejected_by: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub approval_comments: Option<String>,
    pub last_reminder_sent: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text")]
    pub created_by: String,
    #[sea_orm(column_type = "Text")]
    pub last_modified_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn status(&self) -> super::ApprovalStatus {
        super::ApprovalStatus::from(self.approval_status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
