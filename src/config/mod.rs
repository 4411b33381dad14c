//! Configuration management for the meshwell service
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values for the matchmaking service.

pub mod app;
pub mod catalog;
pub mod matchmaking;

// Re-export commonly used types
pub use app::{validate_config, ApiSettings, AppConfig, ServiceSettings};
pub use catalog::{GameSettings, RankEntry};
pub use matchmaking::MatchmakingSettings;
