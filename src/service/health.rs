//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the meshwell
//! service, including readiness and liveness probes.

use crate::service::app::AppState;
use crate::store::StoreStats;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value exported as `meshwell_health_status`
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    /// The worse of two statuses
    fn combine(self, other: HealthStatus) -> HealthStatus {
        if self.as_gauge() <= other.as_gauge() {
            self
        } else {
            other
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub store: StoreStats,
    /// Games with a rank provider registered
    pub supported_games: Vec<String>,
    pub uptime_seconds: u64,
}

impl ComponentCheck {
    fn new(name: &str, status: HealthStatus, message: Option<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

impl HealthCheck {
    /// Check every component and gather store statistics
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let checks = vec![
            Self::check_service_running(&app_state).await,
            Self::check_repository(&app_state),
            Self::check_rank_providers(&app_state),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |acc, check| acc.combine(check.status));

        let metrics = app_state.metrics();
        metrics.update_health_status(status.as_gauge());
        for check in &checks {
            metrics.update_component_health(&check.name, check.status != HealthStatus::Unhealthy);
        }

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats: Self::gather_service_stats(&app_state),
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify the store answers queries
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(Self::check_repository(&app_state).status)
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };
        ComponentCheck::new("service_running", status, message, start)
    }

    fn check_repository(app_state: &AppState) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = match app_state.store_stats() {
            Ok(stats) if stats.games == 0 => (
                HealthStatus::Degraded,
                Some("No games are configured".to_string()),
            ),
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Repository stats check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Stats check failed: {}", e)),
                )
            }
        };
        ComponentCheck::new("repository", status, message, start)
    }

    fn check_rank_providers(app_state: &AppState) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = if app_state.supported_games().is_empty() {
            (
                HealthStatus::Degraded,
                Some("No rank providers registered; accounts cannot be connected".to_string()),
            )
        } else {
            (HealthStatus::Healthy, None)
        };
        ComponentCheck::new("rank_providers", status, message, start)
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let store = app_state.store_stats().unwrap_or_else(|e| {
            debug!("Failed to get store stats for health check: {}", e);
            StoreStats::default()
        });

        ServiceStats {
            store,
            supported_games: app_state.supported_games(),
            uptime_seconds: app_state.uptime().as_secs(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
