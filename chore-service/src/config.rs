//! Configuration management for chore-service
//!
//! Settings come from environment variables, with a `.env` file loaded in
//! development builds.

use anyhow::{Context, Result};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            auth: AuthSettings::from_env()?,
            server: ServerSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
        })
    }
}

/// Token signing settings
///
/// The secret is shared, read-only process state; it is never logged and
/// never serialized.
#[derive(Clone)]
pub struct AuthSettings {
    pub token_secret: String,
}

impl AuthSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            token_secret: env::var("TOKEN_SECRET").context("TOKEN_SECRET must be set")?,
        })
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}
