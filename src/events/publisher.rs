//! Event publisher for outbound session events

use crate::error::Result;
use crate::events::{
    PlayerJoinedSession, PlayerLeftSession, SessionCreated, SessionEvent, SessionRated,
};
use async_trait::async_trait;
use tracing::info;

/// Trait for publishing session events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a SessionCreated event
    async fn publish_session_created(&self, event: SessionCreated) -> Result<()>;

    /// Publish a PlayerJoinedSession event
    async fn publish_player_joined(&self, event: PlayerJoinedSession) -> Result<()>;

    /// Publish a PlayerLeftSession event
    async fn publish_player_left(&self, event: PlayerLeftSession) -> Result<()>;

    /// Publish a SessionRated event
    async fn publish_session_rated(&self, event: SessionRated) -> Result<()>;
}

/// Publisher that writes every event to the structured log
#[derive(Debug, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }

    fn log(&self, event: &SessionEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        info!(event = event.name(), %payload, "Published session event");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish_session_created(&self, event: SessionCreated) -> Result<()> {
        self.log(&SessionEvent::SessionCreated(event))
    }

    async fn publish_player_joined(&self, event: PlayerJoinedSession) -> Result<()> {
        self.log(&SessionEvent::PlayerJoinedSession(event))
    }

    async fn publish_player_left(&self, event: PlayerLeftSession) -> Result<()> {
        self.log(&SessionEvent::PlayerLeftSession(event))
    }

    async fn publish_session_rated(&self, event: SessionRated) -> Result<()> {
        self.log(&SessionEvent::SessionRated(event))
    }
}
