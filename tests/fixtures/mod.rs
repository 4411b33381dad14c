//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use meshwell::accounts::{AccountRequest, RankLookup, RankProvider, RankQuery};
use meshwell::availability::WindowInput;
use meshwell::config::{AppConfig, GameSettings};
use meshwell::error::Result;
use meshwell::events::{
    EventPublisher, PlayerJoinedSession, PlayerLeftSession, SessionCreated, SessionEvent,
    SessionRated,
};
use meshwell::profile::NewProfile;
use meshwell::service::{AppState, Services};
use meshwell::store::{InMemoryRepository, Repository};
use meshwell::types::{Day, Game, Platform, PrefServer, Ranks, RequestContext};
use mockall::mock;
use std::sync::{Arc, Mutex};

pub const GAME: &str = "Rainbow Six Siege";

mock! {
    pub RankService {}

    #[async_trait]
    impl RankProvider for RankService {
        async fn lookup(&self, query: &RankQuery) -> Result<Option<Ranks>>;
    }
}

/// Rank service that knows every tag
pub fn permissive_rank_service() -> MockRankService {
    let mut service = MockRankService::new();
    service.expect_lookup().returning(|_| {
        Ok(Some(Ranks {
            casual: "Gold II".to_string(),
            competitive: "Platinum III".to_string(),
        }))
    });
    service
}

/// Mock event publisher that captures published events for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_published_events(&self) -> Vec<SessionEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| event.name() == event_type)
            .count()
    }

    fn push(&self, event: SessionEvent) {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish_session_created(&self, event: SessionCreated) -> Result<()> {
        self.push(SessionEvent::SessionCreated(event));
        Ok(())
    }

    async fn publish_player_joined(&self, event: PlayerJoinedSession) -> Result<()> {
        self.push(SessionEvent::PlayerJoinedSession(event));
        Ok(())
    }

    async fn publish_player_left(&self, event: PlayerLeftSession) -> Result<()> {
        self.push(SessionEvent::PlayerLeftSession(event));
        Ok(())
    }

    async fn publish_session_rated(&self, event: SessionRated) -> Result<()> {
        self.push(SessionEvent::SessionRated(event));
        Ok(())
    }
}

/// Monday 2030-01-07 12:00 UTC, the clock every test starts from
pub fn monday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, 12, 0, 0).unwrap()
}

/// Saturday after the first Friday following [`monday_noon`]
pub fn following_saturday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 12, 10, 0, 0).unwrap()
}

pub fn first_friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 11).unwrap()
}

pub fn time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

/// Complete system with a capturing publisher and a mocked rank service
pub struct TestSystem {
    pub app: Arc<AppState>,
    pub publisher: Arc<MockEventPublisher>,
    pub game: Game,
}

impl TestSystem {
    pub async fn new(capacity: usize) -> Self {
        Self::with_rank_provider(capacity, Arc::new(permissive_rank_service())).await
    }

    pub async fn with_rank_provider(capacity: usize, provider: Arc<dyn RankProvider>) -> Self {
        let mut config = AppConfig::default();
        config.games = GameSettings::defaults();
        config.matchmaking.session_capacity = capacity;

        let mut ranks = RankLookup::new();
        ranks.register(GAME, provider);

        let publisher = Arc::new(MockEventPublisher::new());
        let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
        let app = AppState::with_components(config, repository, publisher.clone(), Arc::new(ranks))
            .await
            .expect("Failed to build test system");

        let game = app
            .services()
            .list_games()
            .unwrap()
            .into_iter()
            .find(|g| g.name == GAME)
            .expect("Seeded game missing");

        Self {
            app: Arc::new(app),
            publisher,
            game,
        }
    }

    pub fn services(&self) -> &Services {
        self.app.services()
    }

    /// Registered profile, not yet connected to any game
    pub async fn register(&self, username: &str) -> RequestContext {
        let profile = self
            .services()
            .profiles
            .register(
                NewProfile {
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    first_name: "Test".to_string(),
                    last_name: "Player".to_string(),
                    birth_date: NaiveDate::from_ymd_opt(1998, 6, 15).unwrap(),
                    pref_server: PrefServer::Eu,
                    tos: true,
                },
                monday_noon(),
            )
            .await
            .expect("Failed to register profile");
        RequestContext::at(profile.id, monday_noon())
    }

    /// Registered profile with a connected account for the seeded game
    pub async fn player(&self, username: &str) -> RequestContext {
        let ctx = self.register(username).await;
        self.services()
            .accounts
            .connect(
                &ctx,
                AccountRequest {
                    game_id: self.game.id,
                    platform: Platform::Uplay,
                    game_player_tag: format!("{}.R6", username),
                },
            )
            .await
            .expect("Failed to connect account");
        ctx
    }

    /// Connected player available on `day` between the given hours
    pub async fn player_with_window(
        &self,
        username: &str,
        day: Day,
        start_hour: u32,
        end_hour: u32,
        competitive: bool,
    ) -> RequestContext {
        let ctx = self.player(username).await;
        self.services()
            .availability
            .add(
                &ctx,
                WindowInput {
                    day,
                    start_time: time(start_hour),
                    end_time: time(end_hour),
                    competitive,
                },
            )
            .await
            .expect("Failed to add availability");
        ctx
    }
}
