//! HTTP handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::debug;

use crate::ApiState;

/// GET /metrics
///
/// Always 200: failed devices only shrink the body.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let started = Instant::now();
    let snapshot = state.orchestrator.collect().await;
    let body = fritz_metrics::render_prometheus(&snapshot);

    debug!(
        samples = snapshot.sample_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "served scrape"
    );
    (
        StatusCode::OK,
        [(CONTENT_TYPE, fritz_metrics::CONTENT_TYPE)],
        body,
    )
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
