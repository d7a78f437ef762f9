use std::env;
use std::path::PathBuf;

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, thiserror::Error)]
#[error("Config error: {key} must be valid (got {value:?})")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            server: ServerConfig::load()?,
            database: DatabaseConfig::load()?,
        })
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Scheme used when building permalinks (`http` behind most local setups).
    pub public_scheme: String,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:           get_env("CAPTURE_HOST", "127.0.0.1")?,
            port:           get_env("CAPTURE_PORT", "5000")?,
            log_level:      get_env("CAPTURE_LOG", "info")?,
            public_scheme:  get_env("CAPTURE_PUBLIC_SCHEME", "http")?,
            max_body_bytes: get_env("CAPTURE_MAX_BODY_BYTES", "10485760")?, // 10MB
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// DATABASE
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl DatabaseConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            path: get_env("CAPTURE_DB_PATH", "./data/requests.db")?,
        })
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, raw)
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError {
        key: key.to_string(),
        value: raw,
    })
}
