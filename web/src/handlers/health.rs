//! Health and metrics endpoints.
//!
//! Used by load balancers and the Prometheus scraper; neither requires a
//! session.

use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use kiosk_core::providers::KioskStore;
use kiosk_runtime::{HealthReport, HealthStatus};

/// Store and catalog health.
///
/// # Status Codes
///
/// - 200 OK: healthy or degraded
/// - 503 Service Unavailable: the store is unreachable
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
pub async fn health_check<S: KioskStore>(State(state): State<AppState<S>>) -> (StatusCode, Json<HealthReport>) {
    let report = state.kiosk.health().await;

    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(report))
}

/// Prometheus scrape body.
///
/// Empty when no recorder was installed (tests, embedded use).
///
/// ```text
/// GET /metrics
/// ```
#[allow(clippy::unused_async)]
pub async fn metrics<S: KioskStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render().unwrap_or_default(),
    )
}
