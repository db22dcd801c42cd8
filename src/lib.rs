pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
