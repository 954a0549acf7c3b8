//! API configuration module.
//!
//! Configuration is layered:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <path>` / `ORDERDESK_CONFIG`, otherwise
//!    `config.toml` in the platform config directory if it exists
//! 3. `ORDERDESK_*` environment variables
//!
//! The result is validated before the server starts.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Secret used when none is configured. Fine for development only.
pub const DEV_JWT_SECRET: &str = "orderdesk-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// JWT secret key for signing session tokens
    pub jwt_secret: String,

    /// Session lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Directory holding the TTF files for PDFs
    pub fonts_dir: PathBuf,

    /// Font family name, files are `{family}-Regular.ttf` etc.
    pub font_family: String,

    /// Allow any origin (mobile/web front ends served elsewhere)
    pub cors_allow_any: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: PathBuf::from("orderdesk.db"),
            max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 12 * 60 * 60,
            fonts_dir: PathBuf::from("fonts"),
            font_family: "LiberationSans".to_string(),
            cors_allow_any: true,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from file and environment.
    ///
    /// An explicit `path` must exist; the platform default is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => ApiConfig::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies `ORDERDESK_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("ORDERDESK_HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("ORDERDESK_PORT") {
            self.port = parse_var("ORDERDESK_PORT", &v)?;
        }
        if let Some(v) = lookup("ORDERDESK_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ORDERDESK_MAX_CONNECTIONS") {
            self.max_connections = parse_var("ORDERDESK_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("ORDERDESK_JWT_SECRET") {
            self.jwt_secret = v;
        }
        if let Some(v) = lookup("ORDERDESK_SESSION_LIFETIME_SECS") {
            self.session_lifetime_secs = parse_var("ORDERDESK_SESSION_LIFETIME_SECS", &v)?;
        }
        if let Some(v) = lookup("ORDERDESK_FONTS_DIR") {
            self.fonts_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ORDERDESK_FONT_FAMILY") {
            self.font_family = v;
        }
        if let Some(v) = lookup("ORDERDESK_CORS_ALLOW_ANY") {
            self.cors_allow_any = parse_var("ORDERDESK_CORS_ALLOW_ANY", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("session_lifetime_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.font_family.trim().is_empty() {
            return Err(ConfigError::MissingRequired("font_family".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// `config.toml` under the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "orderdesk", "orderdesk").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
