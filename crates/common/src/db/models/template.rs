//! Template entity: the current state of an editable contract template

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub contract_type: String,

    /// Ordered list of responsibility strings
    #[sea_orm(column_type = "JsonBinary")]
    pub responsibilities: Json,

    pub default_duration: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    /// Optimistic concurrency counter; equals history length + 1
    pub version: i32,

    #[sea_orm(column_type = "Text")]
    pub approval_status: String,

    pub is_published: bool,

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
pub enum Relation {
    #[sea_orm(has_many = "super::template_version::Entity", on_delete = "Cascade")]
    Versions,
}

impl Related<super::template_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
