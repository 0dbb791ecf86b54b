//! Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development. Signing secrets have no default:
//! a missing secret is reported, never papered over.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest access-token lifetime accepted (1 day)
pub const MAX_ACCESS_TTL_SECS: u64 = 24 * 3600;

/// Longest refresh-token lifetime accepted (14 days)
pub const MAX_REFRESH_TTL_SECS: u64 = 14 * 24 * 3600;

/// A secret counts as configured only if it has non-whitespace content
pub fn configured_secret(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup)?;
        config.auth.check_lifetimes()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.auth.normalize_secrets();
        config.auth.check_lifetimes()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_overrides(&|key: &str| std::env::var(key).ok())?;
        self.auth.normalize_secrets();
        self.auth.check_lifetimes()?;
        Ok(self)
    }

    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.postgres_url = non_empty(url);
        }

        // Token signing. Sensitive values always come from the environment.
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.access_secret = non_empty(secret);
        }
        if let Some(secret) = lookup("JWT_REFRESH_SECRET") {
            self.auth.refresh_secret = non_empty(secret);
        }
        if let Some(secs) = lookup("JWT_ACCESS_EXPIRATION_SECS") {
            self.auth.access_ttl_secs = parse_value("JWT_ACCESS_EXPIRATION_SECS", secs)?;
        }
        if let Some(secs) = lookup("JWT_REFRESH_EXPIRATION_SECS") {
            self.auth.refresh_ttl_secs = parse_value("JWT_REFRESH_EXPIRATION_SECS", secs)?;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn non_empty(value: String) -> Option<String> {
    configured_secret(Some(&value))?;
    Some(value)
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub postgres_url: Option<String>,

    /// PostgreSQL connection pool size
    pub postgres_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            postgres_pool_size: 10,
        }
    }
}

/// Token signing configuration
///
/// Access and refresh tokens are signed with distinct secrets. Neither has a
/// default value.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    #[serde(skip_serializing)]
    pub access_secret: Option<String>,

    /// HMAC secret for refresh tokens
    #[serde(skip_serializing)]
    pub refresh_secret: Option<String>,

    /// Access token lifetime in seconds (default: 3600 = 1 hour, max 1 day)
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds (default: 7 days, max 14 days)
    pub refresh_ttl_secs: u64,

    /// Token issuer identifier
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: None,
            refresh_secret: None,
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7 * 24 * 3600,
            issuer: "user-mgmt-api".to_string(),
        }
    }
}

impl AuthConfig {
    /// Config with both secrets set and default lifetimes
    pub fn with_secrets(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: Some(access_secret.into()),
            refresh_secret: Some(refresh_secret.into()),
            ..Default::default()
        }
    }

    /// Report every missing secret at once, then any out-of-range lifetime.
    /// Used for startup and readiness checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if configured_secret(self.access_secret.as_deref()).is_none() {
            missing.push("JWT_SECRET");
        }
        if configured_secret(self.refresh_secret.as_deref()).is_none() {
            missing.push("JWT_REFRESH_SECRET");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(missing.join(", ")));
        }
        self.check_lifetimes()
    }

    /// Drop blank secrets so they read as unset everywhere
    pub fn normalize_secrets(&mut self) {
        for secret in [&mut self.access_secret, &mut self.refresh_secret] {
            if configured_secret(secret.as_deref()).is_none() {
                *secret = None;
            }
        }
    }

    fn check_lifetimes(&self) -> Result<(), ConfigError> {
        let bounds = [
            ("JWT_ACCESS_EXPIRATION_SECS", self.access_ttl_secs, MAX_ACCESS_TTL_SECS),
            ("JWT_REFRESH_EXPIRATION_SECS", self.refresh_ttl_secs, MAX_REFRESH_TTL_SECS),
        ];
        for (key, ttl, max) in bounds {
            if ttl == 0 || ttl > max {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: ttl.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<String>| match configured_secret(s.as_deref()) {
            Some(_) => "<redacted>",
            None => "<unset>",
        };
        f.debug_struct("AuthConfig")
            .field("access_secret", &redact(&self.access_secret))
            .field("refresh_secret", &redact(&self.refresh_secret))
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
