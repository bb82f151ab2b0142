// GET handlers: banner, version, metrics

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use super::AppState;
use crate::version::{NAME, VERSION};

pub(super) async fn root_handler() -> impl IntoResponse {
    format!("{NAME} {VERSION}: per-host traffic metrics at /metrics\n")
}

/// GET /version: service name and version baked in at build time.
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /metrics: cumulative byte counters in the Prometheus text format.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "render_metrics", "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
