// HTTP routes: metrics exposition plus a banner and version endpoint

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::metrics::PrometheusSink;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) metrics: Arc<PrometheusSink>,
}

pub fn app(metrics: Arc<PrometheusSink>) -> Router {
    let state = AppState { metrics };
    Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/metrics", get(http::metrics_handler)) // GET /metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
