//! Snapshot history import from CSV exports.

use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use crate::health::SnapshotHistoryEntry;

use super::validation::parse_timestamp;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotImportError {
    #[error("failed to read snapshot export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unparsable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
}

pub struct SnapshotHistoryImporter;

impl SnapshotHistoryImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        vehicle_filter: Option<&str>,
    ) -> Result<Vec<SnapshotHistoryEntry>, SnapshotImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, vehicle_filter)
    }

    /// Read `vehicle_id,timestamp,battery_percentage,speed_kmph,engine_on,charging` rows,
    /// keeping only `vehicle_filter` when given.
    pub fn from_reader<R: Read>(
        reader: R,
        vehicle_filter: Option<&str>,
    ) -> Result<Vec<SnapshotHistoryEntry>, SnapshotImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for (index, record) in csv_reader.deserialize::<SnapshotRow>().enumerate() {
            let row = record?;
            if vehicle_filter.is_some_and(|vehicle| vehicle != row.vehicle_id) {
                continue;
            }

            // Header is line 1.
            let snapshot_timestamp =
                parse_timestamp(&row.timestamp).ok_or_else(|| SnapshotImportError::Timestamp {
                    row: index + 2,
                    value: row.timestamp.clone(),
                })?;

            entries.push(SnapshotHistoryEntry {
                snapshot_timestamp,
                battery_percentage: row.battery_percentage,
                speed_kmph: row.speed_kmph,
                engine_on: row.engine_on,
                charging: row.charging,
            });
        }

        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    vehicle_id: String,
    timestamp: String,
    battery_percentage: f64,
    speed_kmph: f64,
    #[serde(deserialize_with = "flexible_bool")]
    engine_on: bool,
    #[serde(deserialize_with = "flexible_bool")]
    charging: bool,
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, found '{other}'"
        ))),
    }
}
