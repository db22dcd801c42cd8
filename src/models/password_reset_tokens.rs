// ============================================================================
// MODEL : PASSWORD RESET TOKENS
// ============================================================================
//
// Columns:
//   - email          : address the link was sent to
//   - principal_kind : user | admin, which table the email was found in
//   - token_hash     : SHA-256 hex of the token mailed out (never the token)
//   - created_at     : the token expires one hour after this
//
// Workflow:
//   1. POST /api/password/forgot        -> previous row for (email, kind)
//                                          deleted, new row inserted, link mailed
//   2. POST /api/password/reset         -> hash compared, age checked,
//                                          password replaced, row deleted
//
// Points of attention:
//   - At most one row per (email, kind)
//   - An expired token is deleted when someone tries to use it
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::PrincipalKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub email: String,
    pub principal_kind: PrincipalKind,
    pub token_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
