#![allow(dead_code, unused_macros)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tempfile::TempDir;

use complaint_desk::config::AppConfig;
use complaint_desk::db;
use complaint_desk::models::dto::{ComplaintResponse, NewComplaint};
use complaint_desk::models::{PrincipalRef, admins, users};
use complaint_desk::services::{AttachmentStore, AuthService, ClientInfo, ComplaintService, Mailer};
use complaint_desk::utils::password;

pub const TEST_ITERATIONS: u32 = 1000;

/// Builds the full application against a [`TestEnv`] and returns the
/// initialized test service.
macro_rules! spawn_app {
    ($env:expr) => {{
        let env = &$env;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(env.db.clone()))
                .app_data(actix_web::web::Data::new(env.config.clone()))
                .app_data(actix_web::web::Data::new(env.store.clone()))
                .app_data(env.mailer_data())
                .configure(complaint_desk::routes::configure_app),
        )
        .await
    }};
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub name: String,
    pub url: String,
}

/// Keeps every reset link instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, recipient_name: &str, reset_url: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            name: recipient_name.to_string(),
            url: reset_url.to_string(),
        });
        Ok(())
    }
}

pub struct TestEnv {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub store: AttachmentStore,
    pub mailer: Arc<RecordingMailer>,
    pub storage_dir: TempDir,
}

impl TestEnv {
    pub fn mailer_data(&self) -> actix_web::web::Data<dyn Mailer> {
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        actix_web::web::Data::from(mailer)
    }

    pub async fn token_for(&self, principal: PrincipalRef) -> String {
        AuthService::issue_token(&self.db, &self.config, principal, &ClientInfo::default())
            .await
            .unwrap()
    }
}

/// Fresh in-memory database with the schema and default categories.
pub async fn setup() -> TestEnv {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    db::init_schema(&db).await.unwrap();
    db::seed_categories(&db).await.unwrap();

    let storage_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiry_hours: 1,
        storage_root: storage_dir.path().to_path_buf(),
        frontend_url: "http://localhost:4200".to_string(),
        password_iterations: TEST_ITERATIONS,
        seed_defaults: false,
    };

    TestEnv {
        db,
        store: AttachmentStore::new(storage_dir.path()),
        config,
        mailer: Arc::new(RecordingMailer::default()),
        storage_dir,
    }
}

pub async fn seed_user(db: &DatabaseConnection, username: &str, email: &str, plain_password: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password_with(plain_password, TEST_ITERATIONS).unwrap()),
        full_name: Set(format!("{} Person", username)),
        contact_number: Set(None),
        department: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_admin(db: &DatabaseConnection, username: &str, email: &str, plain_password: &str) -> admins::Model {
    let now = Utc::now();
    admins::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password_with(plain_password, TEST_ITERATIONS).unwrap()),
        full_name: Set(format!("{} Admin", username)),
        role: Set("admin".to_string()),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A complaint filed straight through the service, without attachment.
pub async fn file_complaint(env: &TestEnv, user_id: i32, assigned_to: Option<i32>) -> ComplaintResponse {
    ComplaintService::create(
        &env.db,
        &env.store,
        user_id,
        NewComplaint {
            category_id: 1,
            subject: "Air conditioning broken".to_string(),
            description: "Room 204 is too warm".to_string(),
            assigned_to,
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub const BOUNDARY: &str = "----complaint-desk-test-boundary";

/// Hand-built multipart body: text fields plus an optional
/// `(field, file name, content type, bytes)` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                name, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
