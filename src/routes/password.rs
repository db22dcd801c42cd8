use actix_web::{HttpResponse, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::PrincipalKind;
use crate::models::dto::{ForgotPasswordRequest, ResetPasswordRequest};
use crate::services::{Mailer, PasswordResetService};

/// POST /api/password/forgot
#[post("/forgot")]
pub async fn forgot(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let response = PasswordResetService::send_reset_link(db.get_ref(), &config, mailer.get_ref(), &body.email).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/password/forgot/user
#[post("/forgot/user")]
pub async fn forgot_user(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let response = PasswordResetService::send_reset_link_for(
        db.get_ref(),
        &config,
        mailer.get_ref(),
        PrincipalKind::User,
        &body.email,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/password/forgot/admin
#[post("/forgot/admin")]
pub async fn forgot_admin(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn Mailer>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let response = PasswordResetService::send_reset_link_for(
        db.get_ref(),
        &config,
        mailer.get_ref(),
        PrincipalKind::Admin,
        &body.email,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/password/reset
#[post("/reset")]
pub async fn reset(
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let response = PasswordResetService::reset_password(db.get_ref(), &config, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn password_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/password")
            .service(forgot)
            .service(forgot_user)
            .service(forgot_admin)
            .service(reset),
    );
}
