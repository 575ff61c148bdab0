//! racsgpfs-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition, collected on request |
//!
//! There is no authentication and no request parameters. Per-source
//! failures are absorbed by the publisher, so the endpoint answers 200
//! with whatever samples the scrape produced.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use racsgpfs_metrics::MetricPublisher;

/// Shared state for handlers. Read-only after startup.
#[derive(Clone)]
pub struct ApiState {
    pub publisher: Arc<MetricPublisher>,
}

/// Build the exporter router.
pub fn build_router(publisher: Arc<MetricPublisher>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(ApiState { publisher })
}
