use chrono::Utc;
use log::info;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::{ApiError, FieldErrors};
use crate::models::dto::{AdminSummary, AuthResponse, LoginRequest, RegisterRequest};
use crate::models::{PrincipalKind, PrincipalRef, access_tokens, admin_sessions, admins, user_sessions, users};
use crate::utils::jwt::{self, Claims};
use crate::utils::password;

pub const INVALID_CREDENTIALS: &str = "The provided credentials are incorrect.";
pub const ACCOUNT_DEACTIVATED: &str = "Your account has been deactivated.";

/// Where a login came from, recorded on the session row.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AuthService;

impl AuthService {
    /// Creates an active user and logs them straight in.
    pub async fn register(
        db: &DatabaseConnection,
        config: &AppConfig,
        request: RegisterRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, ApiError> {
        request.validate()?;

        let mut errors = FieldErrors::new();
        if users::Entity::find()
            .filter(users::Column::Username.eq(request.username.as_str()))
            .one(db)
            .await?
            .is_some()
        {
            errors.insert("username".to_string(), vec!["The username has already been taken.".to_string()]);
        }
        if users::Entity::find()
            .filter(users::Column::Email.eq(request.email.as_str()))
            .one(db)
            .await?
            .is_some()
        {
            errors.insert("email".to_string(), vec!["The email has already been taken.".to_string()]);
        }
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let password_hash = password::hash_password_with(&request.password, config.password_iterations)
            .map_err(ApiError::Internal)?;
        let now = Utc::now();

        let txn = db.begin().await?;
        let user = users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            full_name: Set(request.full_name),
            contact_number: Set(request.contact_number),
            department: Set(request.department),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let token = Self::issue_token(&txn, config, PrincipalRef::user(user.id), client).await?;
        txn.commit().await?;

        info!("User registered: {} (id={})", user.username, user.id);
        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            user: Some(user),
            admin: None,
            token,
            kind: PrincipalKind::User,
        })
    }

    /// Username or email plus password, against the table of `kind`.
    pub async fn login(
        db: &DatabaseConnection,
        config: &AppConfig,
        kind: PrincipalKind,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, ApiError> {
        request.validate()?;
        let (username, email) = request.identifiers()?;

        let response = match kind {
            PrincipalKind::User => {
                let user = users::Entity::find()
                    .filter(identifier_condition(users::Column::Username, users::Column::Email, username, email))
                    .one(db)
                    .await?
                    .ok_or_else(invalid_credentials)?;
                check_credentials(&request.password, &user.password_hash, user.is_active)?;

                let mut active: users::ActiveModel = user.into();
                active.last_login = Set(Some(Utc::now()));
                let user = active.update(db).await?;

                let token = Self::issue_token(db, config, PrincipalRef::user(user.id), client).await?;
                info!("User logged in: {} (id={})", user.username, user.id);
                AuthResponse {
                    message: "Login successful".to_string(),
                    user: Some(user),
                    admin: None,
                    token,
                    kind,
                }
            }
            PrincipalKind::Admin => {
                let admin = admins::Entity::find()
                    .filter(identifier_condition(admins::Column::Username, admins::Column::Email, username, email))
                    .one(db)
                    .await?
                    .ok_or_else(invalid_credentials)?;
                check_credentials(&request.password, &admin.password_hash, admin.is_active)?;

                let mut active: admins::ActiveModel = admin.into();
                active.last_login = Set(Some(Utc::now()));
                let admin = active.update(db).await?;

                let token = Self::issue_token(db, config, PrincipalRef::admin(admin.id), client).await?;
                info!("Admin logged in: {} (id={})", admin.username, admin.id);
                AuthResponse {
                    message: "Admin login successful".to_string(),
                    user: None,
                    admin: Some(admin),
                    token,
                    kind,
                }
            }
        };

        Ok(response)
    }

    /// Revokes the presented token and closes the principal's open sessions.
    /// For a token that was already revoked only its own session row is closed.
    pub async fn logout(db: &DatabaseConnection, claims: &Claims) -> Result<(), ApiError> {
        let now = Utc::now();
        let txn = db.begin().await?;

        let deleted = access_tokens::Entity::delete_many()
            .filter(access_tokens::Column::TokenId.eq(claims.jti.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        match claims.kind {
            PrincipalKind::User => {
                let mut sessions = user_sessions::Entity::update_many()
                    .col_expr(user_sessions::Column::IsActive, Expr::value(false))
                    .col_expr(user_sessions::Column::LogoutTime, Expr::value(now))
                    .filter(user_sessions::Column::UserId.eq(claims.sub))
                    .filter(user_sessions::Column::IsActive.eq(true));
                if deleted == 0 {
                    sessions = sessions.filter(user_sessions::Column::SessionToken.eq(claims.jti.as_str()));
                }
                sessions.exec(&txn).await?;
            }
            PrincipalKind::Admin => {
                let mut sessions = admin_sessions::Entity::update_many()
                    .col_expr(admin_sessions::Column::IsActive, Expr::value(false))
                    .col_expr(admin_sessions::Column::LogoutTime, Expr::value(now))
                    .filter(admin_sessions::Column::AdminId.eq(claims.sub))
                    .filter(admin_sessions::Column::IsActive.eq(true));
                if deleted == 0 {
                    sessions = sessions.filter(admin_sessions::Column::SessionToken.eq(claims.jti.as_str()));
                }
                sessions.exec(&txn).await?;
            }
        }

        txn.commit().await?;
        info!("{} {} logged out", claims.kind.as_str(), claims.sub);
        Ok(())
    }

    pub async fn user_profile(db: &DatabaseConnection, user_id: i32) -> Result<users::Model, ApiError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn admin_profile(db: &DatabaseConnection, admin_id: i32) -> Result<admins::Model, ApiError> {
        admins::Entity::find_by_id(admin_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))
    }

    /// Active admins a user may assign a complaint to.
    pub async fn available_admins(db: &DatabaseConnection) -> Result<Vec<AdminSummary>, ApiError> {
        let admins = admins::Entity::find()
            .filter(admins::Column::IsActive.eq(true))
            .order_by_asc(admins::Column::FullName)
            .all(db)
            .await?;

        Ok(admins.iter().map(AdminSummary::from).collect())
    }

    /// Signs a token, registers its jti as live and opens a session row.
    pub async fn issue_token<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        principal: PrincipalRef,
        client: &ClientInfo,
    ) -> Result<String, ApiError> {
        let issued = jwt::generate_token(principal.kind, principal.id, &config.jwt_secret, config.jwt_expiry_hours)
            .map_err(ApiError::Internal)?;
        let now = Utc::now();

        access_tokens::ActiveModel {
            token_id: Set(issued.token_id.clone()),
            principal_kind: Set(principal.kind),
            principal_id: Set(principal.id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        match principal.kind {
            PrincipalKind::User => {
                user_sessions::ActiveModel {
                    user_id: Set(principal.id),
                    session_token: Set(issued.token_id),
                    ip_address: Set(client.ip_address.clone()),
                    user_agent: Set(client.user_agent.clone()),
                    login_time: Set(now),
                    logout_time: Set(None),
                    is_active: Set(true),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
            PrincipalKind::Admin => {
                admin_sessions::ActiveModel {
                    admin_id: Set(principal.id),
                    session_token: Set(issued.token_id),
                    ip_address: Set(client.ip_address.clone()),
                    user_agent: Set(client.user_agent.clone()),
                    login_time: Set(now),
                    logout_time: Set(None),
                    is_active: Set(true),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }

        Ok(issued.token)
    }
}

fn identifier_condition<C: ColumnTrait>(
    username_col: C,
    email_col: C,
    username: Option<&str>,
    email: Option<&str>,
) -> Condition {
    let mut condition = Condition::any();
    if let Some(username) = username {
        condition = condition.add(username_col.eq(username));
    }
    if let Some(email) = email {
        condition = condition.add(email_col.eq(email));
    }
    condition
}

fn invalid_credentials() -> ApiError {
    ApiError::field("credentials", INVALID_CREDENTIALS)
}

fn check_credentials(candidate: &str, stored_hash: &str, is_active: bool) -> Result<(), ApiError> {
    if !matches!(password::verify_password(candidate, stored_hash), Ok(true)) {
        return Err(invalid_credentials());
    }
    if !is_active {
        return Err(ApiError::field("credentials", ACCOUNT_DEACTIVATED));
    }
    Ok(())
}
