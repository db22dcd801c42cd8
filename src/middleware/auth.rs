use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::{LocalBoxFuture, Ready, ready};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::{PrincipalKind, PrincipalRef, access_tokens};
use crate::utils::jwt::{self, Claims};

/// Authenticated caller of either kind.
/// The bearer token must be validly signed, unexpired, and not revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPrincipal {
    pub principal: PrincipalRef,
    pub token_id: String,
}

/// Authenticated caller holding a user token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub token_id: String,
}

/// Authenticated caller holding an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAdmin {
    pub admin_id: i32,
    pub token_id: String,
}

/// Claims of a correctly signed token, revoked or not. Only logout uses this,
/// so that logging out twice is harmless.
#[derive(Debug, Clone)]
pub struct SignedClaims(pub Claims);

fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    // 1. Extraire le header Authorization
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;

    // 2. Convertir le header en string
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("Invalid Authorization header".to_string()))?;

    // 3. Format attendu: "Bearer <token>"
    value.strip_prefix("Bearer ").map(str::trim).ok_or_else(|| {
        ApiError::Unauthenticated("Invalid Authorization format (expected: Bearer <token>)".to_string())
    })
}

fn verified_claims(req: &HttpRequest) -> Result<Claims, ApiError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::Internal("AppConfig not registered".to_string()))?;
    let token = bearer_token(req)?;

    jwt::verify_token(token, &config.jwt_secret).map_err(ApiError::Unauthenticated)
}

/// Vérifie le JWT puis la présence du jeton dans access_tokens (révocation).
async fn authenticate(req: HttpRequest) -> Result<AuthPrincipal, ApiError> {
    let claims = verified_claims(&req)?;
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .ok_or_else(|| ApiError::Internal("Database not registered".to_string()))?;

    let live = access_tokens::Entity::find()
        .filter(access_tokens::Column::TokenId.eq(claims.jti.as_str()))
        .filter(access_tokens::Column::PrincipalKind.eq(claims.kind))
        .filter(access_tokens::Column::PrincipalId.eq(claims.sub))
        .one(db.get_ref())
        .await?;

    match live {
        Some(row) => Ok(AuthPrincipal {
            principal: PrincipalRef { kind: row.principal_kind, id: row.principal_id },
            token_id: row.token_id,
        }),
        None => Err(ApiError::Unauthenticated("Unauthenticated.".to_string())),
    }
}

impl FromRequest for AuthPrincipal {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        Box::pin(authenticate(req.clone()))
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let auth = authenticate(req).await?;
            match auth.principal.kind {
                PrincipalKind::User => Ok(AuthUser { user_id: auth.principal.id, token_id: auth.token_id }),
                PrincipalKind::Admin => Err(ApiError::unauthorized()),
            }
        })
    }
}

impl FromRequest for AuthAdmin {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let auth = authenticate(req).await?;
            match auth.principal.kind {
                PrincipalKind::Admin => Ok(AuthAdmin { admin_id: auth.principal.id, token_id: auth.token_id }),
                PrincipalKind::User => Err(ApiError::unauthorized()),
            }
        })
    }
}

impl FromRequest for SignedClaims {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verified_claims(req).map(SignedClaims))
    }
}
