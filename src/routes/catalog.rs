use actix_web::{HttpResponse, get, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::errors::ApiError;
use crate::models::dto::CategoryList;
use crate::services::{AuthService, ComplaintService};

/// GET /api/categories
#[get("/categories")]
pub async fn list_categories(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let categories = ComplaintService::active_categories(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(CategoryList { categories }))
}

/// GET /api/admins/available
#[get("/admins/available")]
pub async fn available_admins(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let admins = AuthService::available_admins(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "admins": admins })))
}

pub fn catalog_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_categories).service(available_admins);
}
