pub mod admin;
pub mod auth;
pub mod catalog;
pub mod complaints;
pub mod health;
pub mod messages;
pub mod password;
pub mod storage;

use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::errors::ApiError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(catalog::catalog_routes)
            .configure(auth::auth_routes)
            .configure(password::password_routes)
            .configure(complaints::complaint_routes)
            .configure(messages::message_routes)
            .configure(admin::admin_routes),
    )
    .service(storage::serve_file);
}

/// Body extractor settings: malformed JSON and multipart bodies become 400s.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        MultipartFormConfig::default()
            .total_limit(64 * 1024 * 1024)
            .memory_limit(1024 * 1024)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    );
}

/// Everything an `App` needs besides its shared state.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    configure_extractors(cfg);
    configure_routes(cfg);
}
