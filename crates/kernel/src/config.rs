//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};
use chrono::FixedOffset;

/// Offset used when `LOCAL_UTC_OFFSET` is unset (Philippine Standard Time).
pub const DEFAULT_LOCAL_OFFSET: &str = "+08:00";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Offset of the barangay's local time. Day boundaries of date filters
    /// and trend buckets are taken at this offset.
    pub local_offset: FixedOffset,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let local_offset = parse_offset(
            &env::var("LOCAL_UTC_OFFSET").unwrap_or_else(|_| DEFAULT_LOCAL_OFFSET.to_string()),
        )?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            local_offset,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a `±HH:MM` offset.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    raw.trim()
        .parse::<FixedOffset>()
        .with_context(|| format!("LOCAL_UTC_OFFSET must look like +08:00, got '{raw}'"))
}
