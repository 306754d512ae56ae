//! REST API handlers.
//!
//! Each handler goes through the recorder or aggregator and returns JSON
//! responses in a `{success, data?, error?}` envelope.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pulse_health::{HealthError, validate};
use pulse_state::CheckStatus;
use tracing::warn;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn health_error_response(err: &HealthError) -> Response {
    let status = match err {
        HealthError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        HealthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(&err.to_string(), status)
}

// ── Write path ─────────────────────────────────────────────────

/// Record request body.
///
/// `status` and `timestamp` are taken as raw JSON so that wrong types and
/// missing fields are rejected as invalid instead of failing inside the
/// extractor.
#[derive(serde::Deserialize)]
pub struct RecordRequest {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub timestamp: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

/// POST /api/v1/health-checks
pub async fn record_health_check(
    State(state): State<ApiState>,
    body: Result<Json<RecordRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let msg = format!("invalid argument: {}", rejection.body_text());
            return error_response(&msg, StatusCode::BAD_REQUEST);
        }
    };
    let result = validate::status_from_json(&req.status).and_then(|status| {
        let ts = validate::timestamp_from_json(&req.timestamp)?;
        state
            .recorder
            .record_timed(status, ts, req.message, req.response_time_ms)
    });
    match result {
        Ok(id) => (
            StatusCode::CREATED,
            ApiResponse::ok(serde_json::json!({ "id": id })),
        )
            .into_response(),
        Err(e) => health_error_response(&e),
    }
}

// ── Read paths ─────────────────────────────────────────────────

/// GET /api/v1/health-checks/recent
pub async fn recent_health_checks(State(state): State<ApiState>) -> impl IntoResponse {
    match state.aggregator.recent() {
        Ok(checks) => ApiResponse::ok(checks).into_response(),
        Err(e) => health_error_response(&e),
    }
}

/// GET /api/v1/health-checks/timeline
pub async fn timeline(State(state): State<ApiState>) -> impl IntoResponse {
    match state.aggregator.timeline() {
        Ok(points) => ApiResponse::ok(points).into_response(),
        Err(e) => health_error_response(&e),
    }
}

/// Uptime query string. `since` is validated by hand for a uniform error.
#[derive(serde::Deserialize)]
pub struct UptimeQuery {
    pub since: Option<String>,
}

/// GET /api/v1/uptime?since=<ms>
pub async fn uptime_stats(
    State(state): State<ApiState>,
    Query(query): Query<UptimeQuery>,
) -> impl IntoResponse {
    let Some(raw) = query.since else {
        return error_response("missing required query parameter: since", StatusCode::BAD_REQUEST);
    };
    match validate::parse_since(&raw).and_then(|since| state.aggregator.uptime_stats(since)) {
        Ok(stats) => ApiResponse::ok(stats).into_response(),
        Err(e) => health_error_response(&e),
    }
}

// ── Probe ──────────────────────────────────────────────────────

/// POST /api/v1/probe
///
/// Runs one probe against the configured target and records it. A `bad`
/// outcome is reported with 500 so callers can alert on the status code.
pub async fn probe_now(State(state): State<ApiState>) -> impl IntoResponse {
    let Some(prober) = state.prober.as_ref() else {
        return error_response("no probe target configured", StatusCode::NOT_FOUND);
    };
    match prober.probe_once().await {
        Ok((_, outcome)) if outcome.status == CheckStatus::Good => {
            ApiResponse::ok(outcome).into_response()
        }
        Ok((id, outcome)) => {
            warn!(id, "on-demand probe reported bad");
            let error = outcome.message.clone();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse {
                    success: false,
                    data: Some(outcome),
                    error,
                }),
            )
                .into_response()
        }
        Err(e) => health_error_response(&e),
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let window_ms = i64::try_from(state.metrics_window.as_millis()).unwrap_or(i64::MAX);
    let since = epoch_millis().saturating_sub(window_ms);
    match state.aggregator.uptime_stats(since) {
        Ok(stats) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            crate::prometheus::render_prometheus(&stats, state.metrics_window),
        )
            .into_response(),
        Err(e) => health_error_response(&e),
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}
