use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use log::{error, info};

use complaint_desk::config::AppConfig;
use complaint_desk::middleware::RequestLogger;
use complaint_desk::services::{AttachmentStore, LogMailer, Mailer};
use complaint_desk::{db, logger, routes};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    logger::setup_logger();

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|e| startup_error("Invalid configuration", e))?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    info!("Database connected");

    db::init_schema(&db)
        .await
        .map_err(|e| startup_error("Failed to create schema", e))?;
    db::seed_categories(&db)
        .await
        .map_err(|e| startup_error("Failed to seed categories", e))?;
    if config.seed_defaults {
        db::seed_demo_accounts(&db, config.password_iterations)
            .await
            .map_err(|e| startup_error("Failed to seed demo accounts", e))?;
    }

    let store = AttachmentStore::new(config.storage_root.clone());
    tokio::fs::create_dir_all(store.root()).await?;
    info!("Serving attachments from {}", store.root().display());

    let bind = (config.host.clone(), config.port);
    let db_data = web::Data::new(db);
    let store_data = web::Data::new(store);
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let mailer_data: web::Data<dyn Mailer> = web::Data::from(mailer);
    let config_data = web::Data::new(config);

    info!("Starting server on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(store_data.clone())
            .app_data(mailer_data.clone())
            .configure(routes::configure_app)
    })
    .bind(bind)?
    .run()
    .await
}
