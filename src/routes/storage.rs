use std::io::ErrorKind;

use actix_web::{HttpResponse, get, web};
use log::error;

use crate::errors::ApiError;
use crate::services::AttachmentStore;
use crate::services::storage::content_type_for;

/// GET /storage/{path}, public attachment bytes.
#[get("/storage/{path:.*}")]
pub async fn serve_file(
    path: web::Path<String>,
    store: web::Data<AttachmentStore>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("File not found".to_string());
    let full_path = store.resolve(&path).ok_or_else(not_found)?;

    match tokio::fs::read(&full_path).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&full_path))
            .body(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
        Err(e) => {
            error!("Failed to read {}: {}", full_path.display(), e);
            Err(ApiError::Internal(format!("Failed to read file: {}", e)))
        }
    }
}
