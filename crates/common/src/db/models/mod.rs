//! SeaORM entity models

mod activity_log;
mod approval_status;
mod contract;
mod notification;
mod scheduler_claim;
mod template;
mod template_version;

pub use approval_status::ApprovalStatus;

pub use template::{
    Entity as TemplateEntity,
    Model as TemplateRow,
    ActiveModel as TemplateActiveModel,
    Column as TemplateColumn,
};

pub use template_version::{
    Entity as TemplateVersionEntity,
    Model as TemplateVersionRow,
    ActiveModel as TemplateVersionActiveModel,
    Column as TemplateVersionColumn,
};

pub use contract::{
    Entity as ContractEntity,
    Model as ContractRow,
    ActiveModel as ContractActiveModel,
    Column as ContractColumn,
};

pub use activity_log::{
    Entity as ActivityLogEntity,
    Model as ActivityLogRow,
    ActiveModel as ActivityLogActiveModel,
    Column as ActivityLogColumn,
};

pub use notification::{
    Entity as NotificationEntity,
    Model as NotificationRow,
    ActiveModel as NotificationActiveModel,
    Column as NotificationColumn,
};

pub use scheduler_claim::{
    Entity as SchedulerClaimEntity,
    Model as SchedulerClaimRow,
    ActiveModel as SchedulerClaimActiveModel,
    Column as SchedulerClaimColumn,
};
