// ============================================================================
// MODEL : COMPLAINTS
// ============================================================================
//
// Central entity of the workflow.
//
//   - complaint_number : CMP-YYYYMMDD-XXXXXX, unique, shown to people
//   - status           : Pending | In Progress | Resolved, any value may follow
//                        any other; each change appends a complaint_updates row
//   - assigned_to      : admin allowed to chat on this complaint (nullable)
//   - resolved_at      : stamped when moved to Resolved, never cleared
//
// Rows are removed only by their owner while Pending. Attachments, updates
// and messages cascade with the complaint.
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{ComplaintStatus, Priority};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub assigned_to: Option<i32>,
    #[sea_orm(unique)]
    pub complaint_number: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub priority: Priority,
    pub status: ComplaintStatus,
    pub is_anonymous: bool,
    pub location: Option<String>,
    pub resolved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::complaint_categories::Entity",
        from = "Column::CategoryId",
        to = "super::complaint_categories::Column::Id",
        on_delete = "Cascade"
    )]
    Category,

    #[sea_orm(
        belongs_to = "super::admins::Entity",
        from = "Column::AssignedTo",
        to = "super::admins::Column::Id",
        on_delete = "SetNull"
    )]
    AssignedAdmin,

    #[sea_orm(has_many = "super::complaint_attachments::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::complaint_updates::Entity")]
    Updates,

    #[sea_orm(has_many = "super::complaint_messages::Entity")]
    Messages,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::complaint_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::admins::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedAdmin.def()
    }
}

impl Related<super::complaint_attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::complaint_updates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl Related<super::complaint_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
