// Database connection, schema creation and seed data

use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Schema, Set,
};

use crate::models::{
    access_tokens, admin_sessions, admins, complaint_attachments, complaint_categories, complaint_messages,
    complaint_updates, complaints, password_reset_tokens, user_sessions, users,
};
use crate::utils::password;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    Database::connect(options).await
}

/// Creates every table that does not exist yet, parents before children.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, admins::Entity).await?;
    create_table(db, complaint_categories::Entity).await?;
    create_table(db, complaints::Entity).await?;
    create_table(db, complaint_attachments::Entity).await?;
    create_table(db, complaint_updates::Entity).await?;
    create_table(db, complaint_messages::Entity).await?;
    create_table(db, user_sessions::Entity).await?;
    create_table(db, admin_sessions::Entity).await?;
    create_table(db, access_tokens::Entity).await?;
    create_table(db, password_reset_tokens::Entity).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

const DEFAULT_CATEGORIES: [(&str, &str); 6] = [
    ("IT Support", "Computer, network, and software issues"),
    ("HR", "Human resources and employee relations"),
    ("Maintenance", "Building and facility maintenance"),
    ("Finance", "Financial and accounting matters"),
    ("Safety", "Safety and security concerns"),
    ("Other", "General complaints and inquiries"),
];

/// Inserts the default categories when the table is empty.
pub async fn seed_categories(db: &DatabaseConnection) -> Result<(), DbErr> {
    if complaint_categories::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    for (name, description) in DEFAULT_CATEGORIES {
        complaint_categories::ActiveModel {
            category_name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("Seeded {} complaint categories", DEFAULT_CATEGORIES.len());
    Ok(())
}

/// Demo accounts (`testuser` / `Test@123`, `admin` / `Admin@123`) for local runs.
pub async fn seed_demo_accounts(db: &DatabaseConnection, iterations: u32) -> Result<(), DbErr> {
    let now = Utc::now();

    if users::Entity::find().count(db).await? == 0 {
        let password_hash = password::hash_password_with("Test@123", iterations)
            .map_err(DbErr::Custom)?;
        users::ActiveModel {
            username: Set("testuser".to_string()),
            email: Set("testuser@example.com".to_string()),
            password_hash: Set(password_hash),
            full_name: Set("Test User".to_string()),
            contact_number: Set(Some("1234567890".to_string())),
            department: Set(Some("IT".to_string())),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded demo user 'testuser'");
    }

    if admins::Entity::find().count(db).await? == 0 {
        let password_hash = password::hash_password_with("Admin@123", iterations).map_err(DbErr::Custom)?;
        admins::ActiveModel {
            username: Set("admin".to_string()),
            email: Set("admin@example.com".to_string()),
            password_hash: Set(password_hash),
            full_name: Set("System Administrator".to_string()),
            role: Set("admin".to_string()),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded demo admin 'admin'");
    }

    Ok(())
}
