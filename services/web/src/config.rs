//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `UserStore` adapter the binary wires in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserStoreKind {
    Postgres,
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Hostname handed to templates so the chat client knows where to connect.
    pub public_host: String,
    pub port: u16,
    pub user_store: UserStoreKind,
    pub database_url: String,
    pub cookie_secret: String,
    pub site_name: String,
    /// Title of the chat page.
    pub page_title: String,
    pub media_url: String,
    pub media_root: PathBuf,
    pub template_root: PathBuf,
    /// Re-read templates on every access instead of caching them.
    pub debug: bool,
    pub session_max_age: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_host_str = var_or("BIND_HOST", "0.0.0.0");
        let bind_host = bind_host_str
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_HOST".to_string(), e.to_string()))?;

        let port_str = var_or("PORT", "8000");
        let port = port_str
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;

        let public_host = var_or("PUBLIC_HOST", "localhost");

        // --- User Store Settings ---
        let user_store = match var_or("USER_STORE", "postgres").to_lowercase().as_str() {
            "postgres" => UserStoreKind::Postgres,
            "memory" => UserStoreKind::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "USER_STORE".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "postgres://{}/{}",
                var_or("DB_HOST", "localhost"),
                var_or("DB_NAME", "parlor")
            )
        });

        // --- Session Settings ---
        let cookie_secret = lookup("COOKIE_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("COOKIE_SECRET".to_string()))?;

        let max_age_str = var_or("SESSION_MAX_AGE_SECS", "86400");
        let session_max_age = max_age_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidValue("SESSION_MAX_AGE_SECS".to_string(), e.to_string())
            })?;

        // --- Presentation Settings ---
        let site_name = var_or("SITE_NAME", "Parlor");
        let page_title = var_or("PAGE_TITLE", "Development");
        let media_url = var_or("MEDIA_URL", "/media/");
        let media_root = PathBuf::from(var_or("MEDIA_ROOT", "./media"));
        let template_root = PathBuf::from(var_or("TEMPLATE_ROOT", "./views"));

        let debug_str = var_or("DEBUG", "false");
        let debug = parse_flag(&debug_str)
            .ok_or_else(|| ConfigError::InvalidValue("DEBUG".to_string(), debug_str.clone()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address: SocketAddr::new(bind_host, port),
            public_host,
            port,
            user_store,
            database_url,
            cookie_secret,
            site_name,
            page_title,
            media_url,
            media_root,
            template_root,
            debug,
            session_max_age,
            log_level,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
