//! Realtime server configuration, loaded from the environment.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Shared secret the external auth provider signs bearer tokens with.
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("REALTIME_PORT")
                .unwrap_or_else(|_| "3002".to_string())
                .parse()
                .context("invalid REALTIME_PORT")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET not set")?,
        })
    }
}
