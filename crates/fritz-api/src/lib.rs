//! fritz-api — HTTP exposition for fritz-exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition, one live scrape per request |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use fritz_collector::ScrapeOrchestrator;

/// Shared state for handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ScrapeOrchestrator>,
}

/// Build the exporter router around an explicitly constructed orchestrator.
pub fn build_router(orchestrator: Arc<ScrapeOrchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
