use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{PrincipalKind, PrincipalRef};

/// One chat entry. The sender is a (sender_id, sender_type) pair that points
/// into either `users` or `admins`, so it carries no foreign key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub complaint_id: i32,
    pub sender_id: i32,
    pub sender_type: PrincipalKind,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub attachment_path: Option<String>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn sender(&self) -> PrincipalRef {
        PrincipalRef { kind: self.sender_type, id: self.sender_id }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaints::Entity",
        from = "Column::ComplaintId",
        to = "super::complaints::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,
}

impl Related<super::complaints::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
