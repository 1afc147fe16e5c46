use battery_health::health::{TelemetrySample, VehicleId};
use battery_health::ingest::{
    InsightLogEntry, InsightLogRepository, NewInsightLog, RepositoryError, TelemetryRepository,
    VehicleRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Per-vehicle snapshot store kept in chronological order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTelemetryRepository {
    snapshots: Arc<Mutex<HashMap<VehicleId, Vec<TelemetrySample>>>>,
    vehicles: Arc<Mutex<HashMap<VehicleId, VehicleRecord>>>,
}

impl InMemoryTelemetryRepository {
    fn lock_snapshots(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<VehicleId, Vec<TelemetrySample>>>, RepositoryError>
    {
        self.snapshots
            .lock()
            .map_err(|_| RepositoryError::Unavailable("snapshot store poisoned".to_string()))
    }

    fn lock_vehicles(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<VehicleId, VehicleRecord>>, RepositoryError> {
        self.vehicles
            .lock()
            .map_err(|_| RepositoryError::Unavailable("vehicle store poisoned".to_string()))
    }
}

impl TelemetryRepository for InMemoryTelemetryRepository {
    fn insert_snapshot(&self, sample: TelemetrySample) -> Result<(), RepositoryError> {
        let mut guard = self.lock_snapshots()?;
        let series = guard.entry(sample.vehicle_id.clone()).or_default();
        let position = series.partition_point(|existing| {
            existing.snapshot_timestamp <= sample.snapshot_timestamp
        });
        series.insert(position, sample);
        Ok(())
    }

    fn recent_snapshots(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<TelemetrySample>, RepositoryError> {
        let guard = self.lock_snapshots()?;
        Ok(guard
            .get(vehicle_id)
            .map(|series| series.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn latest_snapshot(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TelemetrySample>, RepositoryError> {
        let guard = self.lock_snapshots()?;
        Ok(guard
            .get(vehicle_id)
            .and_then(|series| series.last())
            .cloned())
    }

    fn upsert_vehicle(&self, record: VehicleRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock_vehicles()?;
        guard.insert(record.vehicle_id.clone(), record);
        Ok(())
    }

    fn fetch_vehicle(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<VehicleRecord>, RepositoryError> {
        let guard = self.lock_vehicles()?;
        Ok(guard.get(vehicle_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryInsightLog {
    entries: Arc<Mutex<Vec<InsightLogEntry>>>,
}

impl InsightLogRepository for InMemoryInsightLog {
    fn append(&self, entry: NewInsightLog) -> Result<InsightLogEntry, RepositoryError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("insight log poisoned".to_string()))?;
        let stored = InsightLogEntry::from_new(guard.len() as u64 + 1, entry);
        guard.push(stored.clone());
        Ok(stored)
    }

    fn recent(
        &self,
        vehicle_id: &VehicleId,
        limit: usize,
    ) -> Result<Vec<InsightLogEntry>, RepositoryError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("insight log poisoned".to_string()))?;
        Ok(guard
            .iter()
            .rev()
            .filter(|entry| &entry.vehicle_id == vehicle_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
