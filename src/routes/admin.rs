use actix_web::{HttpResponse, get, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::middleware::AuthAdmin;
use crate::models::PrincipalRef;
use crate::models::dto::{ComplaintEnvelope, ComplaintFilterQuery, ComplaintList, UpdateStatusBody};
use crate::services::ComplaintService;

/// GET /api/admin/complaints?status=&category=
#[get("/complaints")]
pub async fn list_complaints(
    _auth: AuthAdmin,
    query: web::Query<ComplaintFilterQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.into_inner().into_filter()?;
    let complaints = ComplaintService::list_all(db.get_ref(), filter).await?;
    Ok(HttpResponse::Ok().json(ComplaintList { complaints }))
}

/// GET /api/admin/complaints/{id}
#[get("/complaints/{id}")]
pub async fn show_complaint(
    auth: AuthAdmin,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let complaint = ComplaintService::show(db.get_ref(), path.into_inner(), PrincipalRef::admin(auth.admin_id)).await?;
    Ok(HttpResponse::Ok().json(ComplaintEnvelope { message: None, complaint }))
}

/// PUT /api/admin/complaints/{id}/status
#[put("/complaints/{id}/status")]
pub async fn update_status(
    auth: AuthAdmin,
    path: web::Path<i32>,
    body: web::Json<UpdateStatusBody>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner().into_request()?;
    let complaint = ComplaintService::transition(db.get_ref(), path.into_inner(), auth.admin_id, request).await?;

    Ok(HttpResponse::Ok().json(ComplaintEnvelope {
        message: Some("Complaint status updated successfully".to_string()),
        complaint,
    }))
}

/// GET /api/admin/statistics
#[get("/statistics")]
pub async fn statistics(_auth: AuthAdmin, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let stats = ComplaintService::statistics(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(super::auth::admin_profile)
            .service(super::auth::admin_logout)
            .service(list_complaints)
            .service(show_complaint)
            .service(update_status)
            .service(statistics),
    );
}
