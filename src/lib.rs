//! Meshwell - matchmaking service for scheduled gaming sessions
//!
//! This crate keeps player profiles, weekly availability windows and
//! connected game accounts, hosts sessions, places queueing players into
//! compatible sessions ranked by commendation preferences, and records
//! post-session ratings.

pub mod accounts;
pub mod api;
pub mod availability;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod preferences;
pub mod profile;
pub mod rating;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MeshwellError, Result};
pub use types::*;

// Re-export key components
pub use events::EventPublisher;
pub use session::{SessionManager, SessionMatcher};
pub use store::{InMemoryRepository, Repository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
