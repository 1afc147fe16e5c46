//! Telemetry intake: payload validation, storage seams, the ingest service, and HTTP routes.

pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use import::{SnapshotHistoryImporter, SnapshotImportError};
pub use repository::{
    InsightLogEntry, InsightLogRepository, NewInsightLog, RepositoryError, TelemetryRepository,
    VehicleRecord,
};
pub use router::{telemetry_router, API_KEY_HEADER};
pub use service::{
    HistoryLimits, TelemetryRecordResult, TelemetryService, TelemetryServiceError,
    VehicleInsights, DEFAULT_HISTORY_SNAPSHOT_LIMIT, DEFAULT_INSIGHTS_HISTORY_LIMIT,
};
pub use validation::{FieldIssue, TelemetryPayload, ValidationError};
