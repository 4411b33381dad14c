//! Service layer for the meshwell matchmaking service
//!
//! This module contains the main application state, the wiring of domain
//! services and background task management for the production service.

pub mod app;
pub mod health;

pub use app::{seed_games, AppState, ServiceError, Services};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
