//! pulse-api — REST API for PulseGrid.
//!
//! Exposes the health-check recorder and uptime aggregator over HTTP.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/health-checks` | Record a probe outcome |
//! | GET | `/api/v1/health-checks/recent` | Last 100 checks, newest insert first |
//! | GET | `/api/v1/health-checks/timeline` | Last 100 checks, chronological |
//! | GET | `/api/v1/uptime?since=<ms>` | Uptime over `[since, now)` |
//! | POST | `/api/v1/probe` | Probe the configured target now |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;
pub mod prometheus;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use pulse_health::{Aggregator, HealthLog, Prober, Recorder};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub recorder: Recorder,
    pub aggregator: Aggregator,
    /// Absent when no probe target is configured.
    pub prober: Option<Prober>,
    /// Trailing window reported on `/metrics`.
    pub metrics_window: Duration,
}

impl ApiState {
    pub fn new(log: Arc<dyn HealthLog>) -> Self {
        Self {
            recorder: Recorder::new(log.clone()),
            aggregator: Aggregator::new(log),
            prober: None,
            metrics_window: Duration::from_secs(24 * 3600),
        }
    }

    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_metrics_window(mut self, window: Duration) -> Self {
        self.metrics_window = window;
        self
    }
}

/// Build the complete API router (REST + metrics).
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/health-checks", post(handlers::record_health_check))
        .route("/health-checks/recent", get(handlers::recent_health_checks))
        .route("/health-checks/timeline", get(handlers::timeline))
        .route("/uptime", get(handlers::uptime_stats))
        .route("/probe", post(handlers::probe_now))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
