use anyhow::{Context, Result};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_POST_TITLE_LENGTH: usize = 200;
pub const MAX_POST_LENGTH: usize = 5000;

const DEFAULT_DATABASE_URL: &str = "sqlite://feedline.db?mode=rwc";

pub fn token_expiration_hours() -> i64 {
    std::env::var("FEEDLINE_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub token_expiration_hours: i64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// local-development defaults.
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("FEEDLINE_PORT") {
            Ok(v) => v.parse::<u16>().context("FEEDLINE_PORT must be a port number")?,
            Err(_) => 8080,
        };

        Ok(Config {
            host: std::env::var("FEEDLINE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: std::env::var("FEEDLINE_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            token_expiration_hours: token_expiration_hours(),
        })
    }
}
