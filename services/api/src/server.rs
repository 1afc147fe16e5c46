use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryInsightLog, InMemoryTelemetryRepository};
use crate::routes::with_telemetry_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use battery_health::config::AppConfig;
use battery_health::error::AppError;
use battery_health::ingest::TelemetryService;
use battery_health::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let parameters = config.rule_parameters()?;
    if config.auth.api_key.is_none() {
        warn!("API_KEY is not set; telemetry endpoints will reject every request");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let rules_version = parameters.version.clone();
    let telemetry_service = Arc::new(TelemetryService::with_limits(
        Arc::new(InMemoryTelemetryRepository::default()),
        Arc::new(InMemoryInsightLog::default()),
        parameters,
        config.history,
    ));

    let app = with_telemetry_routes(telemetry_service, config.auth.api_key.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rules_version = %rules_version,
        history_limit = config.history.snapshots,
        "battery health service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
