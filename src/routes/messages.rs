use actix_web::{HttpResponse, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::middleware::AuthPrincipal;
use crate::models::dto::SendMessageRequest;
use crate::services::MessageService;

/// GET /api/complaints/{id}/messages
#[get("/{id}/messages")]
pub async fn list_messages(
    auth: AuthPrincipal,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let messages = MessageService::list(db.get_ref(), path.into_inner(), auth.principal).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/complaints/{id}/messages
#[post("/{id}/messages")]
pub async fn send_message(
    auth: AuthPrincipal,
    path: web::Path<i32>,
    body: web::Json<SendMessageRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let message = MessageService::send(db.get_ref(), path.into_inner(), auth.principal, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(message))
}

/// GET /api/complaints/{id}/messages/unread-count
#[get("/{id}/messages/unread-count")]
pub async fn unread_count(
    auth: AuthPrincipal,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let count = MessageService::unread_count(db.get_ref(), path.into_inner(), auth.principal).await?;
    Ok(HttpResponse::Ok().json(count))
}

/// PUT /api/messages/{id}/read
#[put("/{id}/read")]
pub async fn mark_read(
    auth: AuthPrincipal,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let response = MessageService::mark_read(db.get_ref(), path.into_inner(), auth.principal).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Mounted inside the `/complaints` scope.
pub fn complaint_message_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_messages)
        .service(send_message)
        .service(unread_count);
}

pub fn message_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/messages").service(mark_read));
}
