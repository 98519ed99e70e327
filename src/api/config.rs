//! API server configuration.
//!
//! Centralizes environment variable parsing with development defaults.
//! Outside development a real `JWT_SECRET` of at least 32 characters is
//! required; a missing or short secret is a [`ConfigError`].

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";
const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable is required in production")]
    MissingJwtSecret,
    #[error("JWT_SECRET must be at least 32 characters in production")]
    WeakJwtSecret,
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Core server configuration.
///
/// | Variable | Default |
/// |---|---|
/// | `HOST` | `0.0.0.0` |
/// | `PORT` | `8081` |
/// | `APP_ENV` | `production` |
/// | `DATABASE_URL` | *(none: in-memory storage)* |
/// | `JWT_SECRET` | dev placeholder in development only |
/// | `ACCESS_TOKEN_TTL_MINUTES` | `1440` |
/// | `REFRESH_TOKEN_TTL_DAYS` | `30` |
/// | `CORS_ORIGINS` | *(none: permissive)* |
/// | `AUTH_RATE_LIMIT_PER_MINUTE` | `60` |
/// | `LOG_FORMAT` | `text` |
/// | `LOG_FILTER` | `info` |
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub app_env: AppEnv,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub cors_origins: Option<Vec<String>>,
    pub auth_rate_limit_per_minute: u32,
    pub log_format: LogFormat,
    pub log_filter: String,
}

impl Default for ApiConfig {
    /// Development configuration with in-memory storage.
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            app_env: AppEnv::Development,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::minutes(1440),
            refresh_token_ttl: Duration::days(30),
            cors_origins: None,
            auth_rate_limit_per_minute: 60,
            log_format: LogFormat::Text,
            log_filter: "info".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    pub fn from_env_fn<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();

        let app_env = match env("APP_ENV")
            .unwrap_or_else(|_| "production".to_string())
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" | "local" | "test" => AppEnv::Development,
            _ => AppEnv::Production,
        };

        let host = env("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = parse_or(&env, "PORT", 8081)?;
        let listen_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "HOST",
                    value: host.clone(),
                })?;

        let jwt_secret = match (env("JWT_SECRET").ok(), app_env) {
            (Some(secret), AppEnv::Production) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::WeakJwtSecret);
            }
            (Some(secret), _) => secret,
            (None, AppEnv::Development) => defaults.jwt_secret.clone(),
            (None, AppEnv::Production) => return Err(ConfigError::MissingJwtSecret),
        };

        let access_minutes: i64 = parse_or(&env, "ACCESS_TOKEN_TTL_MINUTES", 1440)?;
        let refresh_days: i64 = parse_or(&env, "REFRESH_TOKEN_TTL_DAYS", 30)?;

        let cors_origins = env("CORS_ORIGINS").ok().and_then(|raw| {
            let origins: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty() && *origin != "*")
                .map(str::to_string)
                .collect();
            (!origins.is_empty()).then_some(origins)
        });

        let auth_rate_limit_per_minute: u32 = parse_or(&env, "AUTH_RATE_LIMIT_PER_MINUTE", 60)?;

        let log_format = match env("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            app_env,
            database_url: env("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            cors_origins,
            auth_rate_limit_per_minute: auth_rate_limit_per_minute.max(1),
            log_format,
            log_filter: env("LOG_FILTER").unwrap_or(defaults.log_filter),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    pub fn is_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(env: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
{
    match env(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
