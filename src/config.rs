use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::helper::auth_helpers::{AdminCredentials, PasswordCheck};
use crate::models::db_operations::StorageBackend;
use crate::models::DEFAULT_AUTHOR;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub content_path: String,
    pub storage_backend: StorageBackend,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub session_ttl_hours: i64,
    pub use_secure_cookies: bool,
    pub default_author: String,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: Option<String>,
    pub admin_password_hash: Option<String>,
}

fn message(text: impl Into<String>) -> config::ConfigError {
    config::ConfigError::Message(text.into())
}

fn required_var(key: &str) -> Result<String, config::ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| message(format!("FATAL: Environment variable '{}' is not set in your .env file.", key)))
}

/// 128 hex characters decode to the 64 bytes a cookie `Key` needs.
pub fn validate_session_secret(secret: &str) -> Result<(), config::ConfigError> {
    if secret.len() != 128 || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(message(
            "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).",
        ));
    }
    Ok(())
}

pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Whole hours between 1 and a year.
pub fn parse_session_ttl(raw: &str) -> Result<i64, config::ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
        .ok_or_else(|| {
            message(format!(
                "FATAL: 'SESSION_TTL_HOURS' must be a whole number between 1 and {}.",
                MAX_SESSION_TTL_HOURS
            ))
        })
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let content_path = required_var("CONTENT_PATH")?;
        if Path::new(&content_path).is_relative() {
            return Err(message(format!(
                "FATAL: The 'CONTENT_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                content_path
            )));
        }

        let storage_backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "markdown".to_string());
        storage_backend
            .parse::<StorageBackend>()
            .map_err(|e| message(format!("FATAL: 'STORAGE_BACKEND': {}. Use 'markdown' or 'redb'.", e)))?;

        let session_secret_key = required_var("SESSION_SECRET_KEY")?;
        validate_session_secret(&session_secret_key)?;

        let admin_email = required_var("ADMIN_EMAIL")?;
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());
        let admin_password_hash = env::var("ADMIN_PASSWORD_HASH").ok().filter(|v| !v.is_empty());
        match (&admin_password, &admin_password_hash) {
            (Some(_), Some(_)) => {
                return Err(message(
                    "FATAL: Set only one of 'ADMIN_PASSWORD' and 'ADMIN_PASSWORD_HASH'.",
                ))
            }
            (None, None) => {
                return Err(message(
                    "FATAL: One of 'ADMIN_PASSWORD' or 'ADMIN_PASSWORD_HASH' must be set in your .env file.",
                ))
            }
            _ => {}
        }
        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

        let session_ttl_hours =
            parse_session_ttl(&env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "24".to_string()))?;

        let default_author = env::var("DEFAULT_AUTHOR").unwrap_or_else(|_| DEFAULT_AUTHOR.to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let mut builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8080)?
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml).required(false))
            .set_override("content_path", content_path)?
            .set_override("storage_backend", storage_backend.trim().to_lowercase())?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("session_ttl_hours", session_ttl_hours)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("default_author", default_author)?
            .set_override("admin_email", admin_email)?
            .set_override("admin_name", admin_name)?;

        if let Some(password) = admin_password {
            builder = builder.set_override("admin_password", password)?;
        }
        if let Some(hash) = admin_password_hash {
            builder = builder.set_override("admin_password_hash", hash)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn content_dir(&self) -> PathBuf {
        PathBuf::from(&self.content_path)
    }

    pub fn admin_credentials(&self) -> AdminCredentials {
        let password = match (&self.admin_password_hash, &self.admin_password) {
            (Some(hash), _) => PasswordCheck::Bcrypt(hash.clone()),
            (None, Some(plain)) => PasswordCheck::Plain(plain.clone()),
            (None, None) => PasswordCheck::Bcrypt(String::new()),
        };
        AdminCredentials {
            email: self.admin_email.clone(),
            name: self.admin_name.clone(),
            password,
        }
    }
}
