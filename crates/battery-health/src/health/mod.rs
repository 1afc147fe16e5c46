//! Battery health scoring: temporal context, rule evaluation, and driver-facing projection.

pub mod context;
pub mod domain;
pub mod evaluation;
pub mod projector;

#[cfg(test)]
mod tests;

pub use context::{build_evaluation_context, EvaluationContext, RECENT_WINDOW_SIZE};
pub use domain::{
    AlertSeverity, HealthStatus, RecentSnapshot, RuleId, SnapshotHistoryEntry, TelemetrySample,
    UnknownRuleId, VehicleId,
};
pub use evaluation::{
    evaluate_battery_health, BatteryHealthEngine, EvaluationResult, RuleImpact, RuleMetadata,
    RuleParameters, RuleParametersError, StatusBand,
};
pub use projector::{alerts_from_impacts, tips_from_impacts, Alert, DriverTip};
