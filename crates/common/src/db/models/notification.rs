//! In-app notification entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub template_id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub recipient: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub important: bool,

    pub requires_read_receipt: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub related_item_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub related_item_type: Option<String>,

    pub expires_at: Option<DateTimeWithTimeZone>,

    pub read_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
