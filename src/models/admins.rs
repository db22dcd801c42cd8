use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complaints::Entity")]
    AssignedComplaints,

    #[sea_orm(has_many = "super::complaint_updates::Entity")]
    ComplaintUpdates,

    #[sea_orm(has_many = "super::admin_sessions::Entity")]
    Sessions,
}

impl Related<super::complaints::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedComplaints.def()
    }
}

impl Related<super::complaint_updates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComplaintUpdates.def()
    }
}

impl Related<super::admin_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
