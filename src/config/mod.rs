//! Configuration loading for the organization registry.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `ORG_REGISTRY_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "ORG_REGISTRY_";

/// Signing secret shipped as the default; only acceptable for local and test profiles.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

const SUPPORTED_JWT_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Application configuration derived from `ORG_REGISTRY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Master catalog database
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Tenant partition database; falls back to `database_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_database_url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            tenant_database_url: None,
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            jwt_secret: default_jwt_secret(),
            jwt_algorithm: default_jwt_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Database holding the tenant partitions.
    pub fn tenant_database_url(&self) -> &str {
        self.tenant_database_url
            .as_deref()
            .unwrap_or(&self.database_url)
    }

    /// Whether the profile allows development defaults.
    pub fn is_development(&self) -> bool {
        matches!(self.profile.as_str(), "local" | "test")
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        config.jwt_secret = "[REDACTED]".to_string();
        config.database_url = redact_url_password(&config.database_url);
        config.tenant_database_url = config
            .tenant_database_url
            .as_deref()
            .map(redact_url_password);
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr().is_err() {
            return Err(ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
            });
        }

        validate_database_url("DATABASE_URL", &self.database_url)?;
        if let Some(ref tenant_url) = self.tenant_database_url {
            validate_database_url("TENANT_DATABASE_URL", tenant_url)?;
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections {
                value: self.db_max_connections,
            });
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        if !self.is_development() && self.jwt_secret == PLACEHOLDER_JWT_SECRET {
            return Err(ConfigError::PlaceholderJwtSecret {
                profile: self.profile.clone(),
            });
        }

        if !SUPPORTED_JWT_ALGORITHMS.contains(&self.jwt_algorithm.as_str()) {
            return Err(ConfigError::UnsupportedJwtAlgorithm {
                value: self.jwt_algorithm.clone(),
            });
        }

        if self.access_token_expire_minutes == 0 {
            return Err(ConfigError::InvalidTokenLifetime {
                value: self.access_token_expire_minutes,
            });
        }

        Ok(())
    }
}

fn validate_database_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidDatabaseUrl {
            key,
            message: "cannot be empty".to_string(),
        });
    }
    url::Url::parse(value).map_err(|e| ConfigError::InvalidDatabaseUrl {
        key,
        message: e.to_string(),
    })?;
    Ok(())
}

fn redact_url_password(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("REDACTED"));
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://org_registry.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> u64 {
    30
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}'")]
    InvalidBindAddr { value: String },
    #[error("invalid {key}: {message}")]
    InvalidDatabaseUrl { key: &'static str, message: String },
    #[error("database max connections must be at least 1, got {value}")]
    InvalidMaxConnections { value: u32 },
    #[error("JWT secret is missing; set ORG_REGISTRY_JWT_SECRET")]
    MissingJwtSecret,
    #[error("profile '{profile}' must not use the placeholder JWT secret; set ORG_REGISTRY_JWT_SECRET")]
    PlaceholderJwtSecret { profile: String },
    #[error("unsupported JWT algorithm '{value}' (expected HS256, HS384 or HS512)")]
    UnsupportedJwtAlgorithm { value: String },
    #[error("access token lifetime must be positive, got {value} minutes")]
    InvalidTokenLifetime { value: u64 },
}

/// Loads configuration using layered `.env` files and `ORG_REGISTRY_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
    read_process_env: bool,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            read_process_env: true,
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            read_process_env: true,
        }
    }

    /// Ignore the process environment and read only `.env` files.
    pub fn files_only(mut self) -> Self {
        self.read_process_env = false;
        self
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Process environment wins over files.
        if self.read_process_env {
            for (key, value) in env::vars() {
                if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                    layered.insert(stripped.to_string(), value);
                }
            }
        }

        let profile = take_non_empty(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_bind_addr =
            take_non_empty(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take_non_empty(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format =
            take_non_empty(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let database_url =
            take_non_empty(&mut layered, "DATABASE_URL").unwrap_or_else(default_database_url);
        let tenant_database_url = take_non_empty(&mut layered, "TENANT_DATABASE_URL");
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);
        let jwt_secret = take_non_empty(&mut layered, "JWT_SECRET").unwrap_or_else(default_jwt_secret);
        let jwt_algorithm = take_non_empty(&mut layered, "JWT_ALGORITHM")
            .map(|v| v.to_uppercase())
            .unwrap_or_else(default_jwt_algorithm);
        let access_token_expire_minutes = layered
            .remove("ACCESS_TOKEN_EXPIRE_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_access_token_expire_minutes);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            tenant_database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            jwt_secret,
            jwt_algorithm,
            access_token_expire_minutes,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let process_profile = if self.read_process_env {
            env::var(format!("{ENV_PREFIX}PROFILE")).ok()
        } else {
            None
        };
        let profile = process_profile
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn take_non_empty(values: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    values.remove(key).filter(|v| !v.trim().is_empty())
}
