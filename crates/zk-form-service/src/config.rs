//! Configuration management for the zk-form service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Backing store for submission rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Sheets REST API
    Sheets,
    /// Redis lists, for self-hosted deployments
    Redis,
    /// Process memory, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sheets" => Ok(StoreBackend::Sheets),
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND: {} (expected sheets, redis or memory)", other),
        }
    }
}

/// Flags that relax verification outside production
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvFlags {
    /// Verify against the shared development app id
    pub is_dev: bool,

    /// Accept impersonated vaults and skip deduplication
    pub is_demo: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// JSON file listing spaces and their apps
    pub spaces_config: PathBuf,

    /// Base URL of the proof verification service
    pub verifier_url: String,

    /// Request timeout for the verification service
    pub verifier_timeout_secs: u64,

    pub store_backend: StoreBackend,

    /// Google Sheets API base URL
    pub sheets_api_url: String,

    /// OAuth access token for the Sheets API
    pub sheets_access_token: Option<String>,

    /// Tab that receives submissions
    pub sheets_sheet_name: String,

    /// Redis connection URL (redis backend only)
    pub redis_url: String,

    pub flags: EnvFlags,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8085".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            spaces_config: env::var("SPACES_CONFIG")
                .unwrap_or_else(|_| "./config/spaces.json".to_string())
                .into(),

            verifier_url: env::var("VERIFIER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string()),

            verifier_timeout_secs: env::var("VERIFIER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid VERIFIER_TIMEOUT_SECS")?,

            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "sheets".to_string())
                .parse()?,

            sheets_api_url: env::var("SHEETS_API_URL")
                .unwrap_or_else(|_| "https://sheets.googleapis.com/v4".to_string()),

            sheets_access_token: env::var("SHEETS_ACCESS_TOKEN").ok(),

            sheets_sheet_name: env::var("SHEETS_SHEET_NAME")
                .unwrap_or_else(|_| "Sheet1".to_string()),

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            flags: EnvFlags {
                is_dev: parse_flag("IS_DEV")?,
                is_demo: parse_flag("IS_DEMO")?,
            },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.store_backend == StoreBackend::Sheets && self.sheets_access_token.is_none() {
            anyhow::bail!("SHEETS_ACCESS_TOKEN is required when STORE_BACKEND=sheets");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(v) if v == "1" => Ok(true),
        Ok(v) if v == "0" || v.is_empty() => Ok(false),
        Ok(v) => v
            .to_lowercase()
            .parse()
            .with_context(|| format!("Invalid {} (expected true/false)", name)),
        Err(_) => Ok(false),
    }
}
