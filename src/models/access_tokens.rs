// ============================================================================
// MODEL : ACCESS TOKENS
// ============================================================================
//
// One row per live bearer token. The JWT carries `jti`; a signed token whose
// jti has no row here has been revoked (logout) and is refused.
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::PrincipalKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub token_id: String,
    pub principal_kind: PrincipalKind,
    pub principal_id: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
