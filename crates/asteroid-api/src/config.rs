//! Configuration management for the Asteroid API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where asteroid and scenario documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StorageBackend::Redis),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown storage backend: {} (expected redis/memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Redis connection URL
    pub redis_url: String,

    /// Storage backend
    pub storage_backend: StorageBackend,

    /// NeoWs API key
    pub nasa_api_key: String,

    /// NeoWs base URL (without trailing slash)
    pub nasa_base_url: String,

    /// Timeout for one feed request, in seconds
    pub feed_timeout_secs: u64,

    /// Background refresh interval in seconds (0 disables the refresher)
    pub refresh_interval_secs: u64,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            storage_backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()
                .context("Invalid STORAGE_BACKEND")?,

            nasa_api_key: env::var("NASA_API_KEY").unwrap_or_else(|_| "DEMO_KEY".to_string()),

            nasa_base_url: env::var("NASA_BASE_URL")
                .unwrap_or_else(|_| "https://api.nasa.gov/neo/rest/v1".to_string())
                .trim_end_matches('/')
                .to_string(),

            feed_timeout_secs: env::var("FEED_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid FEED_TIMEOUT_SECS")?,

            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("Invalid REFRESH_INTERVAL_SECS")?,

            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
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

        if self.feed_timeout_secs == 0 {
            anyhow::bail!("FEED_TIMEOUT_SECS must be greater than 0");
        }

        if self.nasa_api_key.is_empty() {
            anyhow::bail!("NASA_API_KEY must not be empty");
        }

        if self.cors_origins.is_empty() {
            anyhow::bail!("CORS_ORIGINS must list at least one origin");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Whether any origin may call the API
    pub fn cors_permissive(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
