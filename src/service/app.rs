//! Main application state and service coordination
//!
//! This module contains the production AppState that builds the repository,
//! domain services and HTTP servers from configuration and manages their
//! background tasks.

use crate::accounts::{AccountService, RankLookup};
use crate::api::{ApiServer, ApiServerConfig, ApiState};
use crate::availability::AvailabilityRegistry;
use crate::config::{AppConfig, GameSettings, MatchmakingSettings};
use crate::events::{EventPublisher, LoggingEventPublisher};
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector, MetricsService};
use crate::preferences::PreferenceResolver;
use crate::profile::ProfileService;
use crate::rating::RatingProcessor;
use crate::service::health::HealthCheck;
use crate::session::{PreferenceMatcher, SessionManager};
use crate::store::{InMemoryRepository, Repository, StoreStats};
use crate::types::Game;
use crate::utils::generate_id;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Every domain service, wired against one repository
#[derive(Clone)]
pub struct Services {
    repository: Arc<dyn Repository>,
    pub profiles: ProfileService,
    pub availability: AvailabilityRegistry,
    pub sessions: SessionManager,
    pub ratings: RatingProcessor,
    pub preferences: PreferenceResolver,
    pub accounts: AccountService,
}

impl Services {
    pub fn new(
        settings: &MatchmakingSettings,
        repository: Arc<dyn Repository>,
        event_publisher: Arc<dyn EventPublisher>,
        ranks: Arc<RankLookup>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let matcher = Arc::new(PreferenceMatcher::new(settings.priority_weights));

        Self {
            profiles: ProfileService::new(repository.clone(), metrics.clone()),
            availability: AvailabilityRegistry::new(repository.clone(), metrics.clone()),
            sessions: SessionManager::new(
                repository.clone(),
                matcher,
                event_publisher.clone(),
                metrics.clone(),
                settings.clone(),
            ),
            ratings: RatingProcessor::new(repository.clone(), event_publisher, metrics.clone()),
            preferences: PreferenceResolver::new(repository.clone(), metrics.clone()),
            accounts: AccountService::new(repository.clone(), ranks, metrics),
            repository,
        }
    }

    /// All games, in name order
    pub fn list_games(&self) -> anyhow::Result<Vec<Game>> {
        self.repository.read(|data| data.list_games())
    }
}

/// Insert configured games that the store does not know yet
pub fn seed_games(repository: &dyn Repository, games: &[GameSettings]) -> anyhow::Result<usize> {
    let seeded = repository.transaction(|data| {
        let mut seeded = 0;
        for settings in games {
            if data.find_game_by_name(&settings.name)?.is_some() {
                debug!("Game '{}' already present", settings.name);
                continue;
            }
            data.put_game(Game {
                id: generate_id(),
                name: settings.name.clone(),
                description: settings.description.clone(),
            })?;
            seeded += 1;
        }
        Ok(seeded)
    })?;

    if seeded > 0 {
        info!("Seeded {} games into the store", seeded);
    }
    Ok(seeded)
}

/// Main application state containing all service components
pub struct AppState {
    config: AppConfig,

    repository: Arc<dyn Repository>,

    services: Services,

    ranks: Arc<RankLookup>,

    metrics_collector: Arc<MetricsCollector>,

    /// Servers started by [`AppState::start`], released on shutdown
    metrics_service: Mutex<Option<MetricsService>>,
    api_server: Mutex<Option<Arc<ApiServer>>>,

    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with the bundled repository and publisher
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let ranks = Arc::new(RankLookup::from_config(&config));
        Self::with_components(
            config,
            Arc::new(InMemoryRepository::new()),
            Arc::new(LoggingEventPublisher::new()),
            ranks,
        )
        .await
    }

    /// Initialize the application around caller-supplied seams
    pub async fn with_components(
        config: AppConfig,
        repository: Arc<dyn Repository>,
        event_publisher: Arc<dyn EventPublisher>,
        ranks: Arc<RankLookup>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing meshwell matchmaking service");
        info!(
            "Configuration: service={}, api port={}, metrics port={}",
            config.service.name, config.service.http_port, config.service.metrics_port
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        seed_games(repository.as_ref(), &config.games).map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to seed games: {}", e),
            }
        })?;

        let services = Services::new(
            &config.matchmaking,
            repository.clone(),
            event_publisher,
            ranks.clone(),
            metrics_collector.clone(),
        );
        info!(
            "Rank lookup available for: {:?}",
            ranks.supported_games()
        );

        Ok(Self {
            config,
            repository,
            services,
            ranks,
            metrics_collector,
            metrics_service: Mutex::new(None),
            api_server: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the health server, the API server and background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting meshwell matchmaking service");

        {
            let mut running = self.is_running.write().await;
            if *running {
                warn!("Service already running");
                return Ok(());
            }
            *running = true;
        }

        self.start_metrics_service().await;
        self.start_api_server().await;
        self.start_background_tasks().await;

        info!("Meshwell matchmaking service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of meshwell service");

        self.set_running(false).await;

        if let Some(api_server) = self.api_server.lock().await.take() {
            if let Err(e) = api_server.stop().await {
                warn!("Failed to stop API server: {}", e);
            }
        }

        if let Some(metrics_service) = self.metrics_service.lock().await.take() {
            if let Err(e) = metrics_service.stop().await {
                warn!("Failed to stop metrics service: {}", e);
            }
        }

        self.stop_background_tasks().await;

        let final_stats = self
            .store_stats()
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;
        info!("Final store statistics: {:?}", final_stats);
        info!("Meshwell service shutdown completed");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub(crate) async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }

    pub fn repository(&self) -> Arc<dyn Repository> {
        self.repository.clone()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// State handed to API handlers
    pub fn api_state(&self) -> ApiState {
        ApiState::new(
            self.services.clone(),
            self.config.api.token.clone(),
            self.metrics_collector.clone(),
        )
    }

    pub fn store_stats(&self) -> anyhow::Result<StoreStats> {
        self.repository.read(|data| data.stats())
    }

    pub fn supported_games(&self) -> Vec<String> {
        self.ranks.supported_games()
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    async fn start_metrics_service(self: &Arc<Self>) {
        info!("Starting metrics and health endpoints");

        let health_config = HealthServerConfig {
            port: self.config.service.metrics_port,
            host: self.config.service.host.clone(),
        };
        let health_server = Arc::new(
            HealthServer::new(health_config, self.metrics_collector.clone())
                .with_app_state(self.clone()),
        );
        let metrics_service = MetricsService::new(self.metrics_collector.clone(), health_server);
        *self.metrics_service.lock().await = Some(metrics_service.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });
        self.background_tasks.lock().await.push(handle);
    }

    async fn start_api_server(&self) {
        let api_config = ApiServerConfig {
            host: self.config.service.host.clone(),
            port: self.config.service.http_port,
        };
        let api_server = Arc::new(ApiServer::new(api_config, self.api_state()));
        *self.api_server.lock().await = Some(api_server.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = api_server.start().await {
                error!("API server failed: {}", e);
            } else {
                info!("API server task completed");
            }
        });
        self.background_tasks.lock().await.push(handle);
    }

    /// Uptime and health gauges, refreshed every 60s
    async fn start_background_tasks(self: &Arc<Self>) {
        info!("Starting health metrics task (60s interval)...");

        let state = Arc::downgrade(self);
        let is_running = self.is_running.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            info!("Health metrics task started");

            while *is_running.read().await {
                interval.tick().await;

                let Some(state) = state.upgrade() else {
                    break;
                };
                state
                    .metrics_collector
                    .service()
                    .uptime_seconds
                    .set(state.uptime().as_secs() as i64);

                match HealthCheck::check(state.clone()).await {
                    Ok(health) => debug!(
                        "Health {}: {} open sessions, {} profiles",
                        health.status, health.stats.store.open_sessions, health.stats.store.profiles
                    ),
                    Err(e) => warn!("Health check failed: {}", e),
                }
            }

            info!("Health metrics task stopped");
        });
        self.background_tasks.lock().await.push(handle);
    }

    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }
        info!("All {} background tasks stopped", task_count);
    }
}
