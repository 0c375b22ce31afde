//! CRUD server configuration, loaded from the environment.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub frontend_url: String,
    /// Shared secret the external auth provider signs bearer tokens with —
    /// the same secret the realtime server verifies against, since both
    /// surfaces trust the same identity provider.
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("API_PORT").unwrap_or_else(|_| "3001".to_string()).parse().context("invalid API_PORT")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET not set")?,
        })
    }

    /// The realtime crate's own `Config` shape, built from the same values —
    /// lets `main` construct one `trivia_realtime::AppState` sharing this
    /// process's pool and secret instead of re-reading the environment.
    pub fn realtime_config(&self) -> trivia_realtime::Config {
        trivia_realtime::Config {
            port: self.port,
            database_url: self.database_url.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}
