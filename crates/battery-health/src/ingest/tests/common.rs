use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::health::{RuleParameters, TelemetrySample, VehicleId};
use crate::ingest::repository::{
    InsightLogEntry, InsightLogRepository, NewInsightLog, RepositoryError, TelemetryRepository,
    VehicleRecord,
};
use crate::ingest::{telemetry_router, TelemetryPayload, TelemetryService};

pub(super) const TEST_API_KEY: &str = "test-key";

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

pub(super) fn vehicle() -> VehicleId {
    VehicleId::from("veh-service")
}

/// Stationary, engine running, mild weather.
pub(super) fn idle_sample_at(minutes: i64, battery: f64) -> TelemetrySample {
    TelemetrySample {
        vehicle_id: vehicle(),
        snapshot_timestamp: base_time() + Duration::minutes(minutes),
        battery_percentage: battery,
        speed_kmph: 0.0,
        engine_on: true,
        charging: false,
        ambient_temperature: Some(20.0),
        odometer_km: Some(5_000.0),
    }
}

pub(super) fn payload() -> TelemetryPayload {
    TelemetryPayload {
        vehicle_id: vehicle().0,
        timestamp: "2024-01-01T08:00:00Z".to_string(),
        battery_percentage: 8.0,
        speed_kmph: 0.0,
        engine_on: true,
        charging: false,
        ambient_temperature: Some(45.0),
        odometer_km: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryTelemetry {
    pub(super) snapshots: Arc<Mutex<Vec<TelemetrySample>>>,
    pub(super) vehicles: Arc<Mutex<HashMap<VehicleId, VehicleRecord>>>,
}

impl TelemetryRepository for MemoryTelemetry {
    fn insert_snapshot(&self, sample: TelemetrySample) -> Result<(), RepositoryError> {
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .push(sample);
        Ok(())
    }

    fn recent_snapshots(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<TelemetrySample>, RepositoryError> {
        let guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        let mut matching: Vec<_> = guard
            .iter()
            .filter(|sample| &sample.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.snapshot_timestamp.cmp(&a.snapshot_timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    fn latest_snapshot(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TelemetrySample>, RepositoryError> {
        Ok(self.recent_snapshots(vehicle_id, 1)?.into_iter().next())
    }

    fn upsert_vehicle(&self, record: VehicleRecord) -> Result<(), RepositoryError> {
        self.vehicles
            .lock()
            .expect("vehicle mutex poisoned")
            .insert(record.vehicle_id.clone(), record);
        Ok(())
    }

    fn fetch_vehicle(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<VehicleRecord>, RepositoryError> {
        let guard = self.vehicles.lock().expect("vehicle mutex poisoned");
        Ok(guard.get(vehicle_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryInsightLog {
    pub(super) entries: Arc<Mutex<Vec<InsightLogEntry>>>,
}

impl InsightLogRepository for MemoryInsightLog {
    fn append(&self, entry: NewInsightLog) -> Result<InsightLogEntry, RepositoryError> {
        let mut guard = self.entries.lock().expect("insight mutex poisoned");
        let stored = InsightLogEntry::from_new(guard.len() as u64 + 1, entry);
        guard.push(stored.clone());
        Ok(stored)
    }

    fn recent(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<InsightLogEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("insight mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|entry| &entry.vehicle_id == vehicle_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableTelemetry;

impl TelemetryRepository for UnavailableTelemetry {
    fn insert_snapshot(&self, _sample: TelemetrySample) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent_snapshots(
        &self,
        _vehicle_id: &VehicleId,
        _limit: usize,
    ) -> Result<Vec<TelemetrySample>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_snapshot(
        &self,
        _vehicle_id: &VehicleId,
    ) -> Result<Option<TelemetrySample>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_vehicle(&self, _record: VehicleRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_vehicle(
        &self,
        _vehicle_id: &VehicleId,
    ) -> Result<Option<VehicleRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    TelemetryService<MemoryTelemetry, MemoryInsightLog>,
    Arc<MemoryTelemetry>,
    Arc<MemoryInsightLog>,
) {
    let repository = Arc::new(MemoryTelemetry::default());
    let insight_log = Arc::new(MemoryInsightLog::default());
    let service = TelemetryService::new(
        repository.clone(),
        insight_log.clone(),
        RuleParameters::default(),
    );
    (service, repository, insight_log)
}

pub(super) fn router_with_service(
    service: TelemetryService<MemoryTelemetry, MemoryInsightLog>,
) -> axum::Router {
    telemetry_router(Arc::new(service), Some(TEST_API_KEY.to_string()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
