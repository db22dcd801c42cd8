use serde::{Deserialize, Serialize};

use super::error::ClientError;
use crate::models::dto::AuthResponse;
use crate::models::{PrincipalKind, PrincipalRef, admins, users};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Principal {
    User(users::Model),
    Admin(admins::Model),
}

/// Who is logged in and the bearer token to prove it. Handed out by login and
/// register, passed to every authenticated call, consumed by logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub kind: PrincipalKind,
    pub principal: Principal,
}

impl Session {
    pub fn from_auth(response: AuthResponse) -> Result<Self, ClientError> {
        let principal = match (response.kind, response.user, response.admin) {
            (PrincipalKind::User, Some(user), _) => Principal::User(user),
            (PrincipalKind::Admin, _, Some(admin)) => Principal::Admin(admin),
            (kind, _, _) => {
                return Err(ClientError::Unexpected(format!(
                    "auth response of type {} carries no {} profile",
                    kind.as_str(),
                    kind.as_str()
                )));
            }
        };

        Ok(Self {
            token: response.token,
            kind: response.kind,
            principal,
        })
    }

    pub fn principal_ref(&self) -> PrincipalRef {
        match &self.principal {
            Principal::User(user) => PrincipalRef::user(user.id),
            Principal::Admin(admin) => PrincipalRef::admin(admin.id),
        }
    }

    pub fn full_name(&self) -> &str {
        match &self.principal {
            Principal::User(user) => &user.full_name,
            Principal::Admin(admin) => &admin.full_name,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == PrincipalKind::Admin
    }
}
