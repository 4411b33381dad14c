//! Main application configuration
//!
//! This module defines the primary configuration structures for the meshwell
//! matchmaking service, including environment variable loading, TOML file
//! loading and validation.

use crate::config::catalog::{GameSettings, RankEntry};
use crate::config::matchmaking::MatchmakingSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub api: ApiSettings,
    pub matchmaking: MatchmakingSettings,
    /// Games seeded into the store at startup
    pub games: Vec<GameSettings>,
    /// Rank table served by the built-in rank provider
    pub ranks: Vec<RankEntry>,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Host the HTTP servers bind to
    pub host: String,
    /// Port for the JSON API
    pub http_port: u16,
    /// Port for health and Prometheus endpoints
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// API access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Shared token expected in `Authorization: Token <token>`
    pub token: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "meshwell".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8000,
            metrics_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            token: "change-me".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.games = GameSettings::defaults();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("BIND_HOST") {
            config.service.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(port) = env::var("METRICS_PORT") {
            config.service.metrics_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid METRICS_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // API settings
        if let Ok(token) = env::var("API_TOKEN") {
            config.api.token = token;
        }

        // Matchmaking settings
        if let Ok(capacity) = env::var("SESSION_CAPACITY") {
            config.matchmaking.session_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid SESSION_CAPACITY value: {}", capacity))?;
        }
        if let Ok(minutes) = env::var("MIN_SESSION_MINUTES") {
            config.matchmaking.min_session_minutes = minutes
                .parse()
                .map_err(|_| anyhow!("Invalid MIN_SESSION_MINUTES value: {}", minutes))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(raw)?;
        if config.games.is_empty() {
            config.games = GameSettings::defaults();
        }
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.metrics_port == 0 {
        return Err(anyhow!("Metrics port cannot be 0"));
    }
    if config.service.http_port == config.service.metrics_port {
        return Err(anyhow!("HTTP and metrics ports must differ"));
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.api.token.trim().is_empty() {
        return Err(anyhow!("API token cannot be empty"));
    }

    config.matchmaking.validate()?;

    // Game names key rank providers, so they have to be unique
    let mut names: Vec<&str> = config.games.iter().map(|g| g.name.as_str()).collect();
    names.sort_unstable();
    if names.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(anyhow!("Duplicate game names in configuration"));
    }
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(anyhow!("Game names cannot be empty"));
    }

    for entry in &config.ranks {
        if !config.games.iter().any(|g| g.name == entry.game) {
            return Err(anyhow!(
                "Rank entry for '{}' references unknown game '{}'",
                entry.tag,
                entry.game
            ));
        }
    }

    Ok(())
}
