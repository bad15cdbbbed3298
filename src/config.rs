//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::domain::ConfigError;

/// Per-IP rate limiter settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for public and upload endpoints
    pub general_rps: u32,
    /// Burst size for public and upload endpoints
    pub general_burst: u32,
    /// Requests per second for health endpoints
    pub health_rps: u32,
    /// Burst size for health endpoints
    pub health_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_rps: 10,
            general_burst: 20,
            health_rps: 100,
            health_burst: 100,
        }
    }
}

/// How admin requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    ApiKey,
    /// Every request is an admin. Local development only.
    Dev,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api-key" | "apikey" => Ok(AuthMode::ApiKey),
            "dev" => Ok(AuthMode::Dev),
            other => Err(ConfigError::InvalidValue {
                key: "AUTH_MODE".to_string(),
                message: format!("expected 'api-key' or 'dev', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                message: format!("expected 'pretty' or 'json', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory backend.
    pub database_url: Option<SecretString>,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    /// Absolute origin used for sitemap and alternate links, without a trailing slash.
    pub site_url: String,
    pub auth_mode: AuthMode,
    pub admin_api_key: Option<SecretString>,
    /// Base58 ed25519 seed for upload tokens; a random key is generated when absent.
    pub upload_signing_key: Option<SecretString>,
    pub upload_dir: PathBuf,
    pub upload_public_path: String,
    pub cache_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            db_max_connections: 10,
            run_migrations: true,
            site_url: "http://localhost:3000".to_string(),
            auth_mode: AuthMode::ApiKey,
            admin_api_key: None,
            upload_signing_key: None,
            upload_dir: PathBuf::from("./uploads"),
            upload_public_path: "/uploads".to_string(),
            cache_ttl: Duration::from_secs(60),
            rate_limit: RateLimitConfig::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let auth_mode = match get("AUTH_MODE") {
            Some(v) => v.parse()?,
            None => defaults.auth_mode,
        };
        let admin_api_key = get("ADMIN_API_KEY").map(SecretString::from);
        if auth_mode == AuthMode::ApiKey && admin_api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("ADMIN_API_KEY".to_string()));
        }

        let rate_limit = RateLimitConfig {
            general_rps: parse_or(&get, "RATE_LIMIT_RPS", defaults.rate_limit.general_rps)?,
            general_burst: parse_or(&get, "RATE_LIMIT_BURST", defaults.rate_limit.general_burst)?,
            ..defaults.rate_limit
        };
        if rate_limit.general_rps == 0 || rate_limit.general_burst == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_RPS".to_string(),
                message: "rate limits must be positive".to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            database_url: get("DATABASE_URL").map(SecretString::from),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            run_migrations: parse_or(&get, "RUN_MIGRATIONS", defaults.run_migrations)?,
            site_url: get("SITE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            auth_mode,
            admin_api_key,
            upload_signing_key: get("UPLOAD_SIGNING_KEY").map(SecretString::from),
            upload_dir: get("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            upload_public_path: get("UPLOAD_PUBLIC_PATH")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upload_public_path),
            cache_ttl: Duration::from_secs(parse_or(&get, "CACHE_TTL_SECS", 60u64)?),
            rate_limit,
            log_format: match get("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => defaults.log_format,
            },
        })
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
