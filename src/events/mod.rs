//! Session events announced to the rest of the system

pub mod publisher;

pub use publisher::{EventPublisher, LoggingEventPublisher};

use crate::types::{GameId, ProfileId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A new session was hosted or created for a queue join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub host: ProfileId,
    pub start: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub competitive: bool,
    /// True when created by a host, false when created for a queue join
    pub hosted: bool,
    pub timestamp: DateTime<Utc>,
}

/// A profile joined an existing session through the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoinedSession {
    pub session_id: SessionId,
    pub profile_id: ProfileId,
    pub participants: usize,
    pub capacity: usize,
    pub timestamp: DateTime<Utc>,
}

/// A profile left the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeftSession {
    pub profile_id: ProfileId,
    pub sessions: Vec<SessionId>,
    /// Sessions removed because nobody was left in them
    pub removed_sessions: Vec<SessionId>,
    pub timestamp: DateTime<Utc>,
}

/// A participant submitted a post-session rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRated {
    pub session_id: SessionId,
    pub rated_by: ProfileId,
    pub rating: u8,
    pub commendations: usize,
    pub reports: usize,
    pub timestamp: DateTime<Utc>,
}

/// Any published event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionCreated(SessionCreated),
    PlayerJoinedSession(PlayerJoinedSession),
    PlayerLeftSession(PlayerLeftSession),
    SessionRated(SessionRated),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionCreated(_) => "SessionCreated",
            SessionEvent::PlayerJoinedSession(_) => "PlayerJoinedSession",
            SessionEvent::PlayerLeftSession(_) => "PlayerLeftSession",
            SessionEvent::SessionRated(_) => "SessionRated",
        }
    }
}
