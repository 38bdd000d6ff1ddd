//! Configuration module
//!
//! Settings are read from the environment (and an optional `.env` file).
//! Every value has a default so the service starts with no configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{DEFAULT_QUALITY, MAX_QUALITY};

const DEFAULT_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 500;
const EXTRACTION_CONCURRENCY: usize = 2;
const PREVIEW_TIMEOUT_SECS: u64 = 30;
const PREVIEW_CACHE_CAPACITY: usize = 200;
const THUMBNAIL_MAX_WIDTH: u32 = 300;
const THUMBNAIL_MAX_HEIGHT: u32 = 400;
const THUMBNAIL_QUALITY: u8 = 70;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size_bytes: usize,
    /// Parent directory for uploaded archives; system temp dir when unset
    pub storage_dir: Option<PathBuf>,
    /// Bounds preview extraction and concurrent documents in a batch
    pub extraction_concurrency: usize,
    pub preview_timeout_secs: u64,
    pub preview_cache_capacity: usize,
    pub thumbnail_max_width: u32,
    pub thumbnail_max_height: u32,
    pub thumbnail_quality: u8,
    pub default_quality: u8,
    /// In-flight HTTP requests before the server starts queueing
    pub http_concurrency_limit: usize,
    pub log_json: bool,
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = env_or("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB);

        let log_json = match env::var("LOG_FORMAT") {
            Ok(format) => format.eq_ignore_ascii_case("json"),
            Err(_) => is_production,
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            extraction_concurrency: env_or("EXTRACTION_CONCURRENCY", EXTRACTION_CONCURRENCY),
            preview_timeout_secs: env_or("PREVIEW_TIMEOUT_SECS", PREVIEW_TIMEOUT_SECS),
            preview_cache_capacity: env_or("PREVIEW_CACHE_CAPACITY", PREVIEW_CACHE_CAPACITY),
            thumbnail_max_width: env_or("THUMBNAIL_MAX_WIDTH", THUMBNAIL_MAX_WIDTH),
            thumbnail_max_height: env_or("THUMBNAIL_MAX_HEIGHT", THUMBNAIL_MAX_HEIGHT),
            thumbnail_quality: env_or("THUMBNAIL_QUALITY", THUMBNAIL_QUALITY),
            default_quality: env_or("DEFAULT_QUALITY", DEFAULT_QUALITY),
            http_concurrency_limit: env_or("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT),
            log_json,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults with no environment lookups, for tests and embedded use.
    pub fn for_tests() -> Self {
        Config {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            storage_dir: None,
            extraction_concurrency: EXTRACTION_CONCURRENCY,
            preview_timeout_secs: PREVIEW_TIMEOUT_SECS,
            preview_cache_capacity: PREVIEW_CACHE_CAPACITY,
            thumbnail_max_width: THUMBNAIL_MAX_WIDTH,
            thumbnail_max_height: THUMBNAIL_MAX_HEIGHT,
            thumbnail_quality: THUMBNAIL_QUALITY,
            default_quality: DEFAULT_QUALITY,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            log_json: false,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.extraction_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "EXTRACTION_CONCURRENCY must be greater than 0"
            ));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than 0"
            ));
        }

        if self.preview_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PREVIEW_TIMEOUT_SECS must be greater than 0"));
        }

        if self.preview_cache_capacity == 0 {
            return Err(anyhow::anyhow!(
                "PREVIEW_CACHE_CAPACITY must be greater than 0"
            ));
        }

        if self.thumbnail_max_width == 0 || self.thumbnail_max_height == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_MAX_WIDTH and THUMBNAIL_MAX_HEIGHT must be greater than 0"
            ));
        }

        for (name, quality) in [
            ("THUMBNAIL_QUALITY", self.thumbnail_quality),
            ("DEFAULT_QUALITY", self.default_quality),
        ] {
            if !(1..=MAX_QUALITY).contains(&quality) {
                return Err(anyhow::anyhow!(
                    "{} must be between 1 and {}",
                    name,
                    MAX_QUALITY
                ));
            }
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_bytes
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_secs(self.preview_timeout_secs)
    }
}
