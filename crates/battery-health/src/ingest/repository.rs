use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::{Alert, DriverTip, HealthStatus, TelemetrySample, VehicleId};

/// Last known state of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub vehicle_id: VehicleId,
    pub last_seen_at: DateTime<Utc>,
    pub last_health_score: Option<f64>,
}

/// Insight log row as handed to the repository; the id is assigned on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInsightLog {
    pub vehicle_id: VehicleId,
    pub created_at: DateTime<Utc>,
    pub health_score: f64,
    pub status: HealthStatus,
    pub alerts: Vec<Alert>,
    pub tips: Vec<DriverTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightLogEntry {
    pub id: u64,
    pub vehicle_id: VehicleId,
    pub created_at: DateTime<Utc>,
    pub health_score: f64,
    pub status: HealthStatus,
    pub alerts: Vec<Alert>,
    pub tips: Vec<DriverTip>,
}

impl InsightLogEntry {
    pub fn from_new(id: u64, entry: NewInsightLog) -> Self {
        Self {
            id,
            vehicle_id: entry.vehicle_id,
            created_at: entry.created_at,
            health_score: entry.health_score,
            status: entry.status,
            alerts: entry.alerts,
            tips: entry.tips,
        }
    }
}

/// Snapshot and vehicle storage so the service can be exercised in isolation.
pub trait TelemetryRepository: Send + Sync {
    fn insert_snapshot(&self, sample: TelemetrySample) -> Result<(), RepositoryError>;
    /// Most recent first, at most `limit` entries.
    fn recent_snapshots(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<TelemetrySample>, RepositoryError>;
    fn latest_snapshot(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TelemetrySample>, RepositoryError>;
    fn upsert_vehicle(&self, record: VehicleRecord) -> Result<(), RepositoryError>;
    fn fetch_vehicle(&self, vehicle_id: &VehicleId)
        -> Result<Option<VehicleRecord>, RepositoryError>;
}

/// Append-only log of evaluations served to drivers.
pub trait InsightLogRepository: Send + Sync {
    fn append(&self, entry: NewInsightLog) -> Result<InsightLogEntry, RepositoryError>;
    /// Most recent first, at most `limit` entries.
    fn recent(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<InsightLogEntry>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
