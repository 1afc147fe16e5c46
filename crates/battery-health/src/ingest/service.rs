use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::health::{
    alerts_from_impacts, build_evaluation_context, tips_from_impacts, Alert, BatteryHealthEngine,
    DriverTip, EvaluationResult, HealthStatus, RuleParameters, SnapshotHistoryEntry,
    TelemetrySample, VehicleId,
};

use super::repository::{
    InsightLogEntry, InsightLogRepository, NewInsightLog, RepositoryError, TelemetryRepository,
    VehicleRecord,
};

pub const DEFAULT_HISTORY_SNAPSHOT_LIMIT: usize = 20;
pub const DEFAULT_INSIGHTS_HISTORY_LIMIT: usize = 10;

/// History caps applied when reading prior snapshots and insight logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub snapshots: usize,
    pub insights: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            snapshots: DEFAULT_HISTORY_SNAPSHOT_LIMIT,
            insights: DEFAULT_INSIGHTS_HISTORY_LIMIT,
        }
    }
}

/// Outcome of ingesting one telemetry sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecordResult {
    pub vehicle_id: VehicleId,
    pub score: f64,
    pub status: HealthStatus,
    pub evaluation: EvaluationResult,
    pub alerts: Vec<Alert>,
    pub tips: Vec<DriverTip>,
}

/// Current health view of a registered vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInsights {
    pub vehicle_id: VehicleId,
    pub score: f64,
    pub status: HealthStatus,
    pub telemetry: TelemetrySample,
    pub evaluation: EvaluationResult,
    pub alerts: Vec<Alert>,
    pub tips: Vec<DriverTip>,
    pub history: Vec<InsightLogEntry>,
    pub last_seen_at: DateTime<Utc>,
}

/// Service composing storage, the temporal context builder, and the scoring engine.
pub struct TelemetryService<R, L> {
    repository: Arc<R>,
    insight_log: Arc<L>,
    engine: Arc<BatteryHealthEngine>,
    limits: HistoryLimits,
}

impl<R, L> TelemetryService<R, L>
where
    R: TelemetryRepository + 'static,
    L: InsightLogRepository + 'static,
{
    pub fn new(repository: Arc<R>, insight_log: Arc<L>, parameters: RuleParameters) -> Self {
        Self::with_limits(repository, insight_log, parameters, HistoryLimits::default())
    }

    pub fn with_limits(
        repository: Arc<R>,
        insight_log: Arc<L>,
        parameters: RuleParameters,
        limits: HistoryLimits,
    ) -> Self {
        Self {
            repository,
            insight_log,
            engine: Arc::new(BatteryHealthEngine::new(parameters)),
            limits,
        }
    }

    pub fn engine(&self) -> &BatteryHealthEngine {
        &self.engine
    }

    /// Score a new sample against its history, then persist the sample and the outcome.
    pub fn record(
        &self,
        sample: TelemetrySample,
    ) -> Result<TelemetryRecordResult, TelemetryServiceError> {
        let (evaluation, alerts, tips) = self.evaluate_against_history(&sample)?;

        self.repository.insert_snapshot(sample.clone())?;
        self.repository.upsert_vehicle(VehicleRecord {
            vehicle_id: sample.vehicle_id.clone(),
            last_seen_at: sample.snapshot_timestamp,
            last_health_score: Some(evaluation.score),
        })?;
        self.insight_log.append(NewInsightLog {
            vehicle_id: sample.vehicle_id.clone(),
            created_at: Utc::now(),
            health_score: evaluation.score,
            status: evaluation.status,
            alerts: alerts.clone(),
            tips: tips.clone(),
        })?;

        info!(
            vehicle_id = %sample.vehicle_id,
            score = evaluation.score,
            status = %evaluation.status,
            rules_triggered = ?evaluation.triggered_rules(),
            "telemetry ingested"
        );

        Ok(TelemetryRecordResult {
            vehicle_id: sample.vehicle_id,
            score: evaluation.score,
            status: evaluation.status,
            evaluation,
            alerts,
            tips,
        })
    }

    /// Re-evaluate the latest stored sample of a vehicle and attach its insight history.
    pub fn insights(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<VehicleInsights, TelemetryServiceError> {
        let vehicle = self
            .repository
            .fetch_vehicle(vehicle_id)?
            .ok_or_else(|| TelemetryServiceError::VehicleNotFound(vehicle_id.clone()))?;

        let telemetry = self
            .repository
            .latest_snapshot(vehicle_id)?
            .ok_or_else(|| TelemetryServiceError::NoTelemetry(vehicle_id.clone()))?;

        let (evaluation, alerts, tips) = self.evaluate_against_history(&telemetry)?;
        let history = self.insight_log.recent(vehicle_id, self.limits.insights)?;

        info!(
            vehicle_id = %vehicle_id,
            score = evaluation.score,
            status = %evaluation.status,
            "vehicle insights retrieved"
        );

        Ok(VehicleInsights {
            vehicle_id: vehicle.vehicle_id,
            score: evaluation.score,
            status: evaluation.status,
            telemetry,
            evaluation,
            alerts,
            tips,
            history,
            last_seen_at: vehicle.last_seen_at,
        })
    }

    fn evaluate_against_history(
        &self,
        sample: &TelemetrySample,
    ) -> Result<(EvaluationResult, Vec<Alert>, Vec<DriverTip>), TelemetryServiceError> {
        let history: Vec<SnapshotHistoryEntry> = self
            .repository
            .recent_snapshots(&sample.vehicle_id, self.limits.snapshots)?
            .iter()
            .map(TelemetrySample::history_entry)
            .collect();

        let context = build_evaluation_context(sample, &history);
        debug!(
            vehicle_id = %sample.vehicle_id,
            history = history.len(),
            idle_minutes = context.idle_duration_minutes,
            charging_minutes = context.charging_duration_minutes,
            "evaluation context built"
        );

        let evaluation = self.engine.evaluate(&context);
        let alerts = alerts_from_impacts(&evaluation.rule_impacts);
        let tips = tips_from_impacts(&evaluation.rule_impacts);
        Ok((evaluation, alerts, tips))
    }
}

/// Error raised by the telemetry service.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryServiceError {
    #[error("Vehicle {0} has not been registered yet.")]
    VehicleNotFound(VehicleId),
    #[error("No telemetry available yet for vehicle {0}.")]
    NoTelemetry(VehicleId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
