//! Configuration management for Lectern.

use anyhow::{Context, Result};
use serde::Deserialize;

use quizhall_common::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_REDIS_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_TTL_SECS,
};

/// Where quizzes, attempts and sessions are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Redis,
    /// Process memory; everything is lost on restart
    Memory,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageBackend,

    /// Token required to issue sessions; admin routes are disabled without it
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Session-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session token validity in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
        }
    }
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_timeout() -> u64 { DEFAULT_REQUEST_TIMEOUT_SECS }
fn default_session_ttl() -> u64 { DEFAULT_SESSION_TTL_SECS }

impl AppConfig {
    /// Load configuration from file and `LECTERN__*` environment variables,
    /// with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_sources(config_path)?;

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(storage) = args.storage {
            config.storage = storage;
        }

        Ok(config)
    }

    fn from_sources(config_path: &str) -> Result<Self> {
        if !std::path::Path::new(config_path).exists() {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("LECTERN").separator("__"))
            .build()
            .context("Failed to load config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            listen_addr: default_listen_addr(),
            storage: StorageBackend::default(),
            admin_token: None,
            request_timeout_secs: default_request_timeout(),
            session: SessionConfig::default(),
        }
    }
}
