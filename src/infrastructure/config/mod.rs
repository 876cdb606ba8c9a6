use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub heygen_api_key: String,
    pub heygen_base_url: String,
    pub cache_dir: PathBuf,
    pub cache_retention_days: i64,
    pub poll_max_attempts: u32,
    pub poll_interval_ms: u64,
    pub memory_cache_enabled: bool,
    pub default_voice_id: String,
    pub video_width: u32,
    pub video_height: u32,
    pub video_background: String,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            heygen_api_key: env::var("HEYGEN_API_KEY")?,
            heygen_base_url: env::var("HEYGEN_BASE_URL")
                .unwrap_or_else(|_| "https://api.heygen.com".to_string()),
            cache_dir: env::var("CACHE_DIR")
                .unwrap_or_else(|_| "data/videos".to_string())
                .into(),
            cache_retention_days: env::var("CACHE_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            poll_max_attempts: env::var("POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            memory_cache_enabled: env::var("MEMORY_CACHE_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<String>()
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
            default_voice_id: env::var("DEFAULT_VOICE_ID")
                .unwrap_or_else(|_| "2d5b0e6cf36f460aa7fc47e3eee4ba54".to_string()),
            video_width: env::var("VIDEO_WIDTH")
                .unwrap_or_else(|_| "1280".to_string())
                .parse()?,
            video_height: env::var("VIDEO_HEIGHT")
                .unwrap_or_else(|_| "720".to_string())
                .parse()?,
            video_background: env::var("VIDEO_BACKGROUND")
                .unwrap_or_else(|_| "#F5F5F5".to_string()),
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
