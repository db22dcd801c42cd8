use actix_web::{HttpRequest, HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::middleware::{AuthAdmin, AuthUser, SignedClaims};
use crate::models::PrincipalKind;
use crate::models::dto::{LoginRequest, MessageResponse, RegisterRequest};
use crate::services::{AuthService, ClientInfo};

pub fn client_info(req: &HttpRequest) -> ClientInfo {
    ClientInfo {
        ip_address: req.connection_info().realip_remote_addr().map(str::to_owned),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    }
}

/// POST /api/auth/register
#[post("/register")]
pub async fn register(
    req: HttpRequest,
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let response = AuthService::register(db.get_ref(), &config, body.into_inner(), &client_info(&req)).await?;
    Ok(HttpResponse::Created().json(response))
}

/// POST /api/auth/login
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let response =
        AuthService::login(db.get_ref(), &config, PrincipalKind::User, body.into_inner(), &client_info(&req)).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/auth/admin/login
#[post("/admin/login")]
pub async fn admin_login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let response =
        AuthService::login(db.get_ref(), &config, PrincipalKind::Admin, body.into_inner(), &client_info(&req)).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/user
#[get("")]
pub async fn user_profile(auth: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let user = AuthService::user_profile(db.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// POST /api/user/logout
#[post("/logout")]
pub async fn user_logout(
    claims: SignedClaims,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if claims.0.kind != PrincipalKind::User {
        return Err(ApiError::unauthorized());
    }
    AuthService::logout(db.get_ref(), &claims.0).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/admin/profile
#[get("/profile")]
pub async fn admin_profile(auth: AuthAdmin, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let admin = AuthService::admin_profile(db.get_ref(), auth.admin_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "admin": admin })))
}

/// POST /api/admin/logout
#[post("/logout")]
pub async fn admin_logout(
    claims: SignedClaims,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if claims.0.kind != PrincipalKind::Admin {
        return Err(ApiError::unauthorized());
    }
    AuthService::logout(db.get_ref(), &claims.0).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Admin logged out successfully")))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(admin_login),
    );
    cfg.service(
        web::scope("/user")
            .service(user_profile)
            .service(user_logout),
    );
}
