//! HTTP JSON API
//!
//! Exposes every domain operation over Axum. [`ApiServer`] binds the router
//! and serves it until stopped, mirroring the health server.

pub mod auth;
pub mod error;
pub mod routes;

pub use auth::{Authenticated, Caller, PROFILE_HEADER};
pub use error::{status_for, ApiError};
pub use routes::router;

use crate::metrics::MetricsCollector;
use crate::service::Services;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// State shared by every handler
#[derive(Clone)]
pub struct ApiState {
    services: Services,
    token: Arc<str>,
    metrics: Arc<MetricsCollector>,
}

impl ApiState {
    pub fn new(services: Services, token: impl Into<Arc<str>>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            services,
            token: token.into(),
            metrics,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}

/// Bind address of the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: ApiState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`ApiServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;
        info!("API server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping API server...");
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }
        Ok(())
    }
}
