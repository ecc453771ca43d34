pub mod auth;
pub mod config;
pub mod core;
pub mod follow;
pub mod models;
pub mod posts;
pub mod repositories;
pub mod routes;
pub mod users;

use sqlx::SqlitePool;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub token_expiration_hours: i64,
}

impl AppState {
    pub fn new(pool: SqlitePool, token_expiration_hours: i64) -> Self {
        Self {
            pool,
            token_expiration_hours,
        }
    }
}
