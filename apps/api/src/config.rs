use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where finished exports are delivered.
#[derive(Debug, Clone)]
pub enum DeliveryConfig {
    /// Write into a directory on local disk.
    Local { dir: PathBuf },
    /// Upload to an S3-compatible bucket (AWS or MinIO).
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub delivery: DeliveryConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            delivery: delivery_from_env()?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn delivery_from_env() -> Result<DeliveryConfig> {
    let mode = std::env::var("EXPORT_DELIVERY").unwrap_or_else(|_| "local".to_string());
    match mode.as_str() {
        "local" => Ok(DeliveryConfig::Local {
            dir: std::env::var("EXPORT_DIR")
                .unwrap_or_else(|_| "./exports".to_string())
                .into(),
        }),
        "s3" => Ok(DeliveryConfig::S3 {
            bucket: require_env("S3_BUCKET")?,
            endpoint: require_env("S3_ENDPOINT")?,
            access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
        }),
        other => bail!("EXPORT_DELIVERY must be 'local' or 's3', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
