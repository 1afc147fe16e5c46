use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use battery_health::ingest::{
    telemetry_router, InsightLogRepository, TelemetryRepository, TelemetryService,
};
use serde_json::json;
use std::sync::Arc;

/// Telemetry API plus the operational endpoints, which stay outside the API-key check.
pub(crate) fn with_telemetry_routes<R, L>(
    service: Arc<TelemetryService<R, L>>,
    api_key: Option<String>,
) -> axum::Router
where
    R: TelemetryRepository + 'static,
    L: InsightLogRepository + 'static,
{
    telemetry_router(service, api_key)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Acquire);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
