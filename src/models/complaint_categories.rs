use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// Static lookup table, seeded at start-up and never touched by the workflow.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complaints::Entity")]
    Complaints,
}

impl Related<super::complaints::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaints.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
