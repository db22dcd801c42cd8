use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::dto::{MessageResponse, ResetPasswordRequest};
use crate::models::{PrincipalKind, admins, password_reset_tokens, users};
use crate::services::mailer::Mailer;
use crate::utils::{password, tokens};

pub const RESET_TOKEN_LENGTH: usize = 64;
pub const RESET_LINK_SENT: &str = "Password reset link has been sent to your email address.";
pub const PASSWORD_RESET_DONE: &str =
    "Password has been reset successfully. You can now login with your new password.";

/// A reset token lives one hour from its creation.
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > created_at + reset_token_ttl()
}

/// Email owner, whichever table it was found in.
struct Recipient {
    kind: PrincipalKind,
    email: String,
    full_name: String,
}

pub struct PasswordResetService;

impl PasswordResetService {
    /// Sends a link to whichever account owns `email`. Users are checked before admins.
    pub async fn send_reset_link(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn Mailer,
        email: &str,
    ) -> Result<MessageResponse, ApiError> {
        let recipient = match find_recipient(db, PrincipalKind::User, email).await? {
            Some(found) => Some(found),
            None => find_recipient(db, PrincipalKind::Admin, email).await?,
        };

        let recipient = recipient.ok_or_else(|| {
            ApiError::field("email", "We could not find an account with that email address.")
        })?;

        Self::deliver(db, config, mailer, recipient).await
    }

    /// Same as [`send_reset_link`](Self::send_reset_link), restricted to one table.
    pub async fn send_reset_link_for(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn Mailer,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<MessageResponse, ApiError> {
        let recipient = find_recipient(db, kind, email).await?.ok_or_else(|| {
            let message = match kind {
                PrincipalKind::User => "We could not find a user with that email address.",
                PrincipalKind::Admin => "We could not find an admin with that email address.",
            };
            ApiError::field("email", message)
        })?;

        Self::deliver(db, config, mailer, recipient).await
    }

    async fn deliver(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn Mailer,
        recipient: Recipient,
    ) -> Result<MessageResponse, ApiError> {
        let token = tokens::random_alphanumeric(RESET_TOKEN_LENGTH);

        let txn = db.begin().await?;
        password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::Email.eq(recipient.email.as_str()))
            .filter(password_reset_tokens::Column::PrincipalKind.eq(recipient.kind))
            .exec(&txn)
            .await?;
        password_reset_tokens::ActiveModel {
            email: Set(recipient.email.clone()),
            principal_kind: Set(recipient.kind),
            token_hash: Set(tokens::digest(&token)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        let url = reset_url(&config.frontend_url, &token, &recipient.email, recipient.kind)?;
        mailer
            .send_password_reset(&recipient.email, &recipient.full_name, &url)
            .await
            .map_err(|e| {
                warn!("Failed to send reset email to {}: {}", recipient.email, e);
                ApiError::Internal(format!("Failed to send reset email: {}", e))
            })?;

        info!("Password reset link issued for {} {}", recipient.kind.as_str(), recipient.email);
        Ok(MessageResponse::new(RESET_LINK_SENT))
    }

    /// Consumes a reset token and replaces the password. Tokens are single-use.
    pub async fn reset_password(
        db: &DatabaseConnection,
        config: &AppConfig,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        request.validate()?;
        let kind = request.principal_kind()?;

        let row = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Email.eq(request.email.as_str()))
            .filter(password_reset_tokens::Column::PrincipalKind.eq(kind))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::field("email", "Invalid or expired reset token."))?;

        let presented = tokens::digest(&request.token);
        if !tokens::digest_matches(&presented, &row.token_hash) {
            return Err(ApiError::field("token", "Invalid reset token."));
        }

        if is_expired(row.created_at, Utc::now()) {
            password_reset_tokens::Entity::delete_by_id(row.id).exec(db).await?;
            return Err(ApiError::field("token", "Reset token has expired. Please request a new one."));
        }

        let password_hash = password::hash_password_with(&request.password, config.password_iterations)
            .map_err(ApiError::Internal)?;
        let now = Utc::now();

        let txn = db.begin().await?;
        let updated = match kind {
            PrincipalKind::User => {
                users::Entity::update_many()
                    .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
                    .col_expr(users::Column::UpdatedAt, Expr::value(now))
                    .filter(users::Column::Email.eq(request.email.as_str()))
                    .exec(&txn)
                    .await?
            }
            PrincipalKind::Admin => {
                admins::Entity::update_many()
                    .col_expr(admins::Column::PasswordHash, Expr::value(password_hash))
                    .col_expr(admins::Column::UpdatedAt, Expr::value(now))
                    .filter(admins::Column::Email.eq(request.email.as_str()))
                    .exec(&txn)
                    .await?
            }
        };

        if updated.rows_affected == 0 {
            return Err(ApiError::field("email", "We could not find an account with that email address."));
        }

        password_reset_tokens::Entity::delete_by_id(row.id).exec(&txn).await?;
        txn.commit().await?;

        info!("Password reset for {} {}", kind.as_str(), request.email);
        Ok(MessageResponse::new(PASSWORD_RESET_DONE))
    }
}

async fn find_recipient(
    db: &DatabaseConnection,
    kind: PrincipalKind,
    email: &str,
) -> Result<Option<Recipient>, ApiError> {
    let recipient = match kind {
        PrincipalKind::User => users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .map(|user| Recipient { kind, email: user.email, full_name: user.full_name }),
        PrincipalKind::Admin => admins::Entity::find()
            .filter(admins::Column::Email.eq(email))
            .one(db)
            .await?
            .map(|admin| Recipient { kind, email: admin.email, full_name: admin.full_name }),
    };
    Ok(recipient)
}

/// `<frontend>/reset-password?token=..&email=..&type=..`
pub fn reset_url(frontend_url: &str, token: &str, email: &str, kind: PrincipalKind) -> Result<String, ApiError> {
    let base = format!("{}/reset-password", frontend_url.trim_end_matches('/'));
    reqwest::Url::parse_with_params(&base, &[("token", token), ("email", email), ("type", kind.as_str())])
        .map(String::from)
        .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_URL: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let created = Utc::now();
        assert!(!is_expired(created, created));
        assert!(!is_expired(created, created + Duration::hours(1)));
        assert!(is_expired(created, created + Duration::hours(1) + Duration::seconds(1)));
    }

    #[test]
    fn test_reset_url_encodes_email() {
        let url = reset_url("http://localhost:4200/", "abc", "a+b@example.com", PrincipalKind::Admin).unwrap();
        assert_eq!(
            url,
            "http://localhost:4200/reset-password?token=abc&email=a%2Bb%40example.com&type=admin"
        );
    }
}
