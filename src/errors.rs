use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{debug, error, warn};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

/// Field name → human readable messages, serialized as the `errors` object of a 422.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {}", first_message(.0))]
    Validation(FieldErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A business rule refused the operation (e.g. deleting a complaint that left Pending).
    #[error("rule violation: {0}")]
    RuleViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn unauthorized() -> Self {
        ApiError::Forbidden("Unauthorized".to_string())
    }
}

fn first_message(errors: &FieldErrors) -> String {
    errors
        .values()
        .flat_map(|messages| messages.iter())
        .next()
        .cloned()
        .unwrap_or_else(|| "The given data was invalid.".to_string())
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, failures) in errors.field_errors() {
            let field = field.to_string();
            let messages = failures
                .iter()
                .map(|failure| match &failure.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field.replace('_', " ")),
                })
                .collect();
            fields.insert(field, messages);
        }
        ApiError::Validation(fields)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::RuleViolation(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(errors) => {
                debug!("Validation error: {:?}", errors);
                json!({ "message": first_message(errors), "errors": errors })
            }
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => {
                warn!("{}: {}", status, msg);
                json!({ "error": msg })
            }
            ApiError::Unauthenticated(msg)
            | ApiError::RuleViolation(msg)
            | ApiError::NotFound(msg) => {
                debug!("{}: {}", status, msg);
                json!({ "message": msg })
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                json!({ "error": "Database error" })
            }
            ApiError::Internal(msg) => {
                error!("Internal server error: {}", msg);
                json!({ "error": "Internal server error" })
            }
        };

        HttpResponse::build(status).json(body)
    }
}
