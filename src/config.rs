//! Environment-driven configuration.

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Wrapped so it never lands in logs.
    pub database_url: SecretString,
    /// Bucket or container name for execution-report backups.
    pub backup_bucket: String,
    /// Default tracing filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            backup_bucket: required_var("BACKUP_BUCKET")?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("missing environment variable {name}")))
}
