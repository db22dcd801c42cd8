use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PrincipalKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,             // principal id
    pub kind: PrincipalKind,  // which table `sub` points into
    pub jti: String,          // access_tokens.token_id
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token together with its id.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
}

/// Génère un JWT pour un utilisateur ou un admin
pub fn generate_token(
    kind: PrincipalKind,
    principal_id: i32,
    secret: &str,
    expiry_hours: i64,
) -> Result<IssuedToken, String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(expiry_hours))
        .ok_or("Failed to calculate expiration")?;

    let claims = Claims {
        sub: principal_id,
        kind,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| format!("Failed to generate token: {}", e))?;

    Ok(IssuedToken { token, token_id: claims.jti })
}

/// Vérifie la signature et l'expiration, puis décode les claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}
