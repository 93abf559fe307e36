//! Server configuration loaded from the environment

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Secret used when `JWT_SECRET` is unset outside production
const DEV_JWT_SECRET: &str = "skillswap-dev-secret";

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    pub cors_allowed_origins: Vec<String>,
    pub media_upload_url: Option<String>,
    pub media_upload_preset: Option<String>,
    pub media_upload_folder: Option<String>,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: var("DATABASE_URL"),
            db_max_connections: parse(&var, "DB_MAX_CONNECTIONS", "number", 5)?,
            host: parse(&var, "HOST", "IP address", IpAddr::from([127, 0, 0, 1]))?,
            port: parse(&var, "PORT", "port number", 5001)?,
            jwt_secret,
            token_ttl_days: parse(&var, "TOKEN_TTL_DAYS", "number of days", 7)?,
            bcrypt_cost: parse(&var, "BCRYPT_COST", "bcrypt cost", 10)?,
            secure_cookies: production,
            cors_allowed_origins,
            media_upload_url: var("MEDIA_UPLOAD_URL"),
            media_upload_preset: var("MEDIA_UPLOAD_PRESET"),
            media_upload_folder: var("MEDIA_UPLOAD_FOLDER"),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
