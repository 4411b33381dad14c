//! Matchmaking configuration

use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Session and queue matching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Maximum participants per session
    pub session_capacity: usize,
    /// Minimum length of a session in minutes
    pub min_session_minutes: i64,
    /// Score weight per priority slot, highest priority first
    pub priority_weights: [f64; 4],
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            session_capacity: 5,
            min_session_minutes: 60,
            priority_weights: [4.0, 3.0, 2.0, 1.0],
        }
    }
}

impl MatchmakingSettings {
    pub fn min_session_length(&self) -> Duration {
        Duration::minutes(self.min_session_minutes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_capacity < 2 {
            return Err(anyhow!("Session capacity must be at least 2"));
        }
        if self.session_capacity > 10 {
            return Err(anyhow!("Session capacity cannot exceed 10 players"));
        }
        if self.min_session_minutes <= 0 {
            return Err(anyhow!("Minimum session length must be positive"));
        }
        if self.priority_weights.iter().any(|w| *w < 0.0) {
            return Err(anyhow!("Priority weights cannot be negative"));
        }
        Ok(())
    }
}
