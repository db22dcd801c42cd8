use actix_multipart::form::MultipartForm;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_web::{HttpResponse, delete, get, post, web};
use sea_orm::DatabaseConnection;

use crate::errors::{ApiError, FieldErrors};
use crate::middleware::{AuthPrincipal, AuthUser};
use crate::models::Priority;
use crate::models::dto::{ComplaintEnvelope, ComplaintList, MessageResponse, NewComplaint};
use crate::services::{AttachmentStore, ComplaintService, UploadedFile};

/// Multipart body of `POST /api/complaints`. Everything is optional at this
/// level so that missing or malformed fields come back as 422s.
#[derive(MultipartForm)]
pub struct ComplaintForm {
    pub category_id: Option<Text<String>>,
    pub subject: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub assigned_to: Option<Text<String>>,
    pub is_anonymous: Option<Text<String>>,
    pub priority: Option<Text<String>>,
    pub location: Option<Text<String>>,
    #[multipart(limit = "64MiB")]
    pub attachment: Option<TempFile>,
}

fn text(field: &Option<Text<String>>) -> Option<&str> {
    field.as_ref().map(|t| t.0.trim()).filter(|s| !s.is_empty())
}

impl ComplaintForm {
    /// Field values plus a view of the uploaded temp file. The temp file lives
    /// as long as the form does.
    pub fn to_parts(&self) -> Result<(NewComplaint, Option<UploadedFile>), ApiError> {
        let mut errors = FieldErrors::new();
        let mut reject = |field: &str, message: &str| {
            errors.entry(field.to_string()).or_default().push(message.to_string());
        };

        let category_id = match text(&self.category_id) {
            None => {
                reject("category_id", "The category id field is required.");
                0
            }
            Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
                reject("category_id", "The category id must be an integer.");
                0
            }),
        };

        let assigned_to = match text(&self.assigned_to) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    reject("assigned_to", "The assigned to must be an integer.");
                    None
                }
            },
        };

        let is_anonymous = match text(&self.is_anonymous) {
            None | Some("0") | Some("false") | Some("off") => false,
            Some("1") | Some("true") | Some("on") => true,
            Some(_) => {
                reject("is_anonymous", "The is anonymous field must be true or false.");
                false
            }
        };

        let priority = match text(&self.priority) {
            None => None,
            Some(label) => {
                let parsed = Priority::from_label(label);
                if parsed.is_none() {
                    reject("priority", "The selected priority is invalid.");
                }
                parsed
            }
        };

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let complaint = NewComplaint {
            category_id,
            subject: text(&self.subject).unwrap_or_default().to_string(),
            description: text(&self.description).unwrap_or_default().to_string(),
            assigned_to,
            is_anonymous,
            priority,
            location: text(&self.location).map(str::to_string),
        };

        let attachment = self
            .attachment
            .as_ref()
            .filter(|file| file.size > 0 || file.file_name.as_deref().is_some_and(|name| !name.is_empty()))
            .map(|file| UploadedFile {
                file_name: file.file_name.clone().unwrap_or_else(|| "attachment".to_string()),
                mime_type: file
                    .content_type
                    .as_ref()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                size: file.size as u64,
                temp_path: file.file.path().to_path_buf(),
            });

        Ok((complaint, attachment))
    }
}

/// POST /api/complaints
#[post("")]
pub async fn create_complaint(
    auth: AuthUser,
    MultipartForm(form): MultipartForm<ComplaintForm>,
    db: web::Data<DatabaseConnection>,
    store: web::Data<AttachmentStore>,
) -> Result<HttpResponse, ApiError> {
    let (complaint, attachment) = form.to_parts()?;
    let complaint = ComplaintService::create(db.get_ref(), &store, auth.user_id, complaint, attachment).await?;

    Ok(HttpResponse::Created().json(ComplaintEnvelope {
        message: Some("Complaint submitted successfully".to_string()),
        complaint,
    }))
}

/// GET /api/complaints
#[get("")]
pub async fn list_own_complaints(auth: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let complaints = ComplaintService::list_for_user(db.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ComplaintList { complaints }))
}

/// GET /api/complaints/{id}
#[get("/{id}")]
pub async fn show_complaint(
    auth: AuthPrincipal,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let complaint = ComplaintService::show(db.get_ref(), path.into_inner(), auth.principal).await?;
    Ok(HttpResponse::Ok().json(ComplaintEnvelope { message: None, complaint }))
}

/// DELETE /api/complaints/{id}
#[delete("/{id}")]
pub async fn delete_complaint(
    auth: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    store: web::Data<AttachmentStore>,
) -> Result<HttpResponse, ApiError> {
    ComplaintService::delete(db.get_ref(), &store, path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Complaint deleted successfully")))
}

pub fn complaint_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/complaints")
            .service(create_complaint)
            .service(list_own_complaints)
            .configure(super::messages::complaint_message_routes)
            .service(show_complaint)
            .service(delete_complaint),
    );
}
