pub mod auth;
pub mod request_log;

pub use auth::{AuthAdmin, AuthPrincipal, AuthUser, SignedClaims};
pub use request_log::RequestLogger;
