use std::env;
use std::path::PathBuf;

use log::warn;

const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";

/// Runtime configuration, read once at start-up from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Root directory of the public attachment store.
    pub storage_root: PathBuf,
    /// Base URL of the web front-end, used to build password reset links.
    pub frontend_url: String,
    pub password_iterations: u32,
    /// Insert the demo user and admin on start-up.
    pub seed_defaults: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not found in environment, using default (INSECURE)");
            DEFAULT_JWT_SECRET.to_string()
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080),
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            jwt_secret,
            jwt_expiry_hours: parse_var("JWT_EXPIRY_HOURS", 24),
            storage_root: env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/app/public")),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            password_iterations: parse_var("PASSWORD_ITERATIONS", crate::utils::password::ITERATIONS),
            seed_defaults: parse_var("SEED_DEFAULTS", false),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL must be set".to_string());
        }

        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using the default JWT secret is not secure for production!");
        }

        if self.jwt_expiry_hours <= 0 {
            return Err("JWT_EXPIRY_HOURS must be positive".to_string());
        }

        if self.password_iterations == 0 {
            return Err("PASSWORD_ITERATIONS must be positive".to_string());
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
