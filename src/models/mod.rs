// ============================================================================
// MODELS - MAIN MODULE
// ============================================================================
//
// Entry point for every data model. Each entity maps to one table with SeaORM.
//
// Modules:
//   - enums : status / priority / principal kind, stored as strings
//   - users, admins : the two principal tables
//   - complaint_categories : static lookup
//   - complaints : central workflow entity
//   - complaint_attachments : at most one uploaded file per complaint
//   - complaint_updates : audit trail of status changes
//   - complaint_messages : per-complaint chat log
//   - user_sessions, admin_sessions : login telemetry
//   - access_tokens : live bearer tokens (revoked on logout)
//   - password_reset_tokens : one-hour reset tokens
//   - dto : API request / response shapes
//
// ============================================================================

pub mod enums;
pub mod dto;
pub mod users;
pub mod admins;
pub mod complaint_categories;
pub mod complaints;
pub mod complaint_attachments;
pub mod complaint_updates;
pub mod complaint_messages;
pub mod user_sessions;
pub mod admin_sessions;
pub mod access_tokens;
pub mod password_reset_tokens;

pub use enums::{ComplaintStatus, PrincipalKind, PrincipalRef, Priority};
