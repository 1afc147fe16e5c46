use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::health::VehicleId;

use super::repository::{InsightLogRepository, TelemetryRepository};
use super::service::{TelemetryService, TelemetryServiceError};
use super::validation::TelemetryPayload;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Router builder exposing telemetry ingest and vehicle insight endpoints.
///
/// Every route requires the `x-api-key` header to match `api_key`; with no key configured all
/// requests are rejected.
pub fn telemetry_router<R, L>(
    service: Arc<TelemetryService<R, L>>,
    api_key: Option<String>,
) -> Router
where
    R: TelemetryRepository + 'static,
    L: InsightLogRepository + 'static,
{
    let api_key = ApiKey(api_key.filter(|key| !key.is_empty()).map(Arc::from));

    Router::new()
        .route("/api/v1/telemetry", post(ingest_handler::<R, L>))
        .route(
            "/api/v1/vehicles/:vehicle_id/insights",
            get(insights_handler::<R, L>),
        )
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key))
        .with_state(service)
}

#[derive(Clone)]
pub(crate) struct ApiKey(Option<Arc<str>>);

pub(crate) async fn require_api_key(
    State(ApiKey(expected)): State<ApiKey>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        error!("API_KEY is not configured; rejecting request");
        return ApiError::unauthorized("Unauthorized").into_response();
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided != Some(expected.as_ref()) {
        warn!(path = %request.uri().path(), "rejected request with invalid API key");
        return ApiError::unauthorized("Invalid API key").into_response();
    }

    next.run(request).await
}

pub(crate) async fn ingest_handler<R, L>(
    State(service): State<Arc<TelemetryService<R, L>>>,
    payload: Result<Json<TelemetryPayload>, JsonRejection>,
) -> Response
where
    R: TelemetryRepository + 'static,
    L: InsightLogRepository + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return ApiError::bad_request(
                "Request validation failed",
                Some(json!([{ "field": "body", "message": rejection.body_text() }])),
            )
            .into_response();
        }
    };

    let sample = match payload.validate() {
        Ok(sample) => sample,
        Err(err) => {
            return ApiError::bad_request("Request validation failed", Some(json!(err.issues)))
                .into_response();
        }
    };

    match service.record(sample.clone()) {
        Ok(result) => {
            let body = json!({
                "data": {
                    "vehicleId": result.vehicle_id,
                    "score": result.score,
                    "status": result.status,
                    "baseScore": result.evaluation.base_score,
                    "alerts": result.alerts,
                    "tips": result.tips,
                    "ruleImpacts": result.evaluation.rule_impacts,
                    "telemetry": sample,
                }
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub(crate) async fn insights_handler<R, L>(
    State(service): State<Arc<TelemetryService<R, L>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    R: TelemetryRepository + 'static,
    L: InsightLogRepository + 'static,
{
    match service.insights(&VehicleId(vehicle_id)) {
        Ok(insights) => (StatusCode::OK, Json(json!({ "data": insights }))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Error envelope shared by the telemetry endpoints.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    fn bad_request(message: &str, details: Option<Value>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.to_string(),
            details,
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: message.to_string(),
            details: None,
        }
    }
}

impl From<TelemetryServiceError> for ApiError {
    fn from(err: TelemetryServiceError) -> Self {
        match err {
            TelemetryServiceError::VehicleNotFound(_) | TelemetryServiceError::NoTelemetry(_) => {
                Self {
                    status: StatusCode::NOT_FOUND,
                    code: "NOT_FOUND",
                    message: err.to_string(),
                    details: None,
                }
            }
            TelemetryServiceError::Repository(source) => {
                error!(error = %source, "telemetry repository failure");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "INTERNAL_SERVER_ERROR",
                    message: "Something went wrong. Try again later.".to_string(),
                    details: None,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }

        (self.status, Json(json!({ "error": error }))).into_response()
    }
}
