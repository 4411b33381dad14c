//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the meshwell matchmaking
//! service using Prometheus metrics.

use crate::error::error_kind;
use crate::types::Commend;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a queue join was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Joined an existing open session
    Matched,
    /// No candidate fit; a new session was created
    Created,
}

impl QueueOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueOutcome::Matched => "matched",
            QueueOutcome::Created => "created",
        }
    }
}

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Session lifecycle metrics
    session_metrics: SessionMetrics,

    /// Rating and commendation metrics
    rating_metrics: RatingMetrics,

    /// Profile, availability and account metrics
    profile_metrics: ProfileMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// HTTP API requests by route and status code
    pub http_requests_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Session lifecycle metrics
#[derive(Clone)]
pub struct SessionMetrics {
    /// Sessions created, by origin (hosted or queued)
    pub sessions_created_total: IntCounterVec,

    /// Queue joins, by outcome
    pub queue_joins_total: IntCounterVec,

    /// Queue leaves
    pub queue_leaves_total: IntCounter,

    /// Sessions removed because their last participant left
    pub sessions_removed_total: IntCounter,

    /// Participants in a session after a join
    pub session_fill: Histogram,
}

/// Rating and commendation metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Ratings submitted
    pub ratings_submitted_total: IntCounter,

    /// Commendations awarded, by kind
    pub commendations_total: IntCounterVec,

    /// Reports filed
    pub reports_total: IntCounter,

    /// Submitted rating values
    pub rating_values: Histogram,
}

/// Profile, availability and account metrics
#[derive(Clone)]
pub struct ProfileMetrics {
    /// Profiles registered
    pub profiles_registered_total: IntCounter,

    /// Profiles deactivated
    pub profiles_deactivated_total: IntCounter,

    /// Availability window changes, by action
    pub availability_changes_total: IntCounterVec,

    /// Account connection attempts, by status
    pub account_connections_total: IntCounterVec,

    /// Preference saves
    pub preference_updates_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Domain operation durations
    pub operation_duration: HistogramVec,

    /// Failed operations by operation and error kind
    pub operation_errors_total: IntCounterVec,

    /// Time spent scoring queue candidates
    pub matching_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let session_metrics = SessionMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let profile_metrics = ProfileMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            session_metrics,
            rating_metrics,
            profile_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get session metrics
    pub fn session(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get profile metrics
    pub fn profile(&self) -> &ProfileMetrics {
        &self.profile_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Render every registered metric in Prometheus text format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Record a session being created
    pub fn record_session_created(&self, hosted: bool) {
        let origin = if hosted { "hosted" } else { "queued" };
        self.session_metrics
            .sessions_created_total
            .with_label_values(&[origin])
            .inc();
    }

    /// Record a successful queue join
    pub fn record_queue_join(&self, outcome: QueueOutcome, participants: usize) {
        self.session_metrics
            .queue_joins_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.session_metrics.session_fill.observe(participants as f64);
    }

    /// Record a queue leave and the sessions it emptied
    pub fn record_queue_leave(&self, sessions_removed: usize) {
        self.session_metrics.queue_leaves_total.inc();
        self.session_metrics
            .sessions_removed_total
            .inc_by(sessions_removed as u64);
    }

    /// Record a rating submission and what it awarded
    pub fn record_rating(&self, rating: u8, commends: &[Commend], reports: usize) {
        self.rating_metrics.ratings_submitted_total.inc();
        self.rating_metrics.rating_values.observe(rating as f64);
        for commend in commends {
            self.rating_metrics
                .commendations_total
                .with_label_values(&[commend.as_str()])
                .inc();
        }
        self.rating_metrics.reports_total.inc_by(reports as u64);
    }

    pub fn record_profile_registered(&self) {
        self.profile_metrics.profiles_registered_total.inc();
    }

    pub fn record_profile_deactivated(&self) {
        self.profile_metrics.profiles_deactivated_total.inc();
    }

    /// Record an availability change (`added`, `edited` or `removed`)
    pub fn record_availability_change(&self, action: &str) {
        self.profile_metrics
            .availability_changes_total
            .with_label_values(&[action])
            .inc();
    }

    /// Record an account connection attempt
    pub fn record_account_connection(&self, success: bool) {
        let status = if success { "success" } else { "failed" };
        self.profile_metrics
            .account_connections_total
            .with_label_values(&[status])
            .inc();
    }

    pub fn record_preference_update(&self) {
        self.profile_metrics.preference_updates_total.inc();
    }

    /// Record candidate scoring duration
    pub fn record_matching(&self, duration: Duration) {
        self.performance_metrics
            .matching_duration
            .observe(duration.as_secs_f64());
    }

    /// Record the duration and outcome of a domain operation
    pub fn record_operation<T>(&self, operation: &str, result: &Result<T>, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());

        if let Err(error) = result {
            self.performance_metrics
                .operation_errors_total
                .with_label_values(&[operation, error_kind(error).as_str()])
                .inc();
        }
    }

    /// Record an HTTP API response
    pub fn record_http_request(&self, route: &str, status: u16) {
        self.service_metrics
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::new("meshwell_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("meshwell_http_requests_total", "Total HTTP API requests"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let health_status = IntGauge::new(
            "meshwell_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("meshwell_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            http_requests_total,
            health_status,
            component_health,
        })
    }
}

impl SessionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let sessions_created_total = IntCounterVec::new(
            Opts::new("meshwell_sessions_created_total", "Total sessions created"),
            &["origin"],
        )?;
        registry.register(Box::new(sessions_created_total.clone()))?;

        let queue_joins_total = IntCounterVec::new(
            Opts::new("meshwell_queue_joins_total", "Total queue joins"),
            &["outcome"],
        )?;
        registry.register(Box::new(queue_joins_total.clone()))?;

        let queue_leaves_total =
            IntCounter::new("meshwell_queue_leaves_total", "Total queue leaves")?;
        registry.register(Box::new(queue_leaves_total.clone()))?;

        let sessions_removed_total = IntCounter::new(
            "meshwell_sessions_removed_total",
            "Sessions removed after their last participant left",
        )?;
        registry.register(Box::new(sessions_removed_total.clone()))?;

        let session_fill = Histogram::with_opts(
            HistogramOpts::new(
                "meshwell_session_fill",
                "Participants in a session after a queue join",
            )
            .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0]),
        )?;
        registry.register(Box::new(session_fill.clone()))?;

        Ok(Self {
            sessions_created_total,
            queue_joins_total,
            queue_leaves_total,
            sessions_removed_total,
            session_fill,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let ratings_submitted_total =
            IntCounter::new("meshwell_ratings_submitted_total", "Total ratings submitted")?;
        registry.register(Box::new(ratings_submitted_total.clone()))?;

        let commendations_total = IntCounterVec::new(
            Opts::new("meshwell_commendations_total", "Total commendations awarded"),
            &["kind"],
        )?;
        registry.register(Box::new(commendations_total.clone()))?;

        let reports_total = IntCounter::new("meshwell_reports_total", "Total reports filed")?;
        registry.register(Box::new(reports_total.clone()))?;

        let rating_values = Histogram::with_opts(
            HistogramOpts::new("meshwell_rating_values", "Submitted session ratings")
                .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
        )?;
        registry.register(Box::new(rating_values.clone()))?;

        Ok(Self {
            ratings_submitted_total,
            commendations_total,
            reports_total,
            rating_values,
        })
    }
}

impl ProfileMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let profiles_registered_total = IntCounter::new(
            "meshwell_profiles_registered_total",
            "Total profiles registered",
        )?;
        registry.register(Box::new(profiles_registered_total.clone()))?;

        let profiles_deactivated_total = IntCounter::new(
            "meshwell_profiles_deactivated_total",
            "Total profiles deactivated",
        )?;
        registry.register(Box::new(profiles_deactivated_total.clone()))?;

        let availability_changes_total = IntCounterVec::new(
            Opts::new(
                "meshwell_availability_changes_total",
                "Total availability window changes",
            ),
            &["action"],
        )?;
        registry.register(Box::new(availability_changes_total.clone()))?;

        let account_connections_total = IntCounterVec::new(
            Opts::new(
                "meshwell_account_connections_total",
                "Total game account connection attempts",
            ),
            &["status"],
        )?;
        registry.register(Box::new(account_connections_total.clone()))?;

        let preference_updates_total = IntCounter::new(
            "meshwell_preference_updates_total",
            "Total matchmaking preference saves",
        )?;
        registry.register(Box::new(preference_updates_total.clone()))?;

        Ok(Self {
            profiles_registered_total,
            profiles_deactivated_total,
            availability_changes_total,
            account_connections_total,
            preference_updates_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "meshwell_operation_duration_seconds",
                "Domain operation duration",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let operation_errors_total = IntCounterVec::new(
            Opts::new(
                "meshwell_operation_errors_total",
                "Failed domain operations",
            ),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operation_errors_total.clone()))?;

        let matching_duration = Histogram::with_opts(
            HistogramOpts::new(
                "meshwell_matching_duration_seconds",
                "Queue candidate scoring time",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05]),
        )?;
        registry.register(Box::new(matching_duration.clone()))?;

        Ok(Self {
            operation_duration,
            operation_errors_total,
            matching_duration,
        })
    }
}
