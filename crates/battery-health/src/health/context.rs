//! Temporal context reconstruction.
//!
//! Snapshot history arrives as a flat, unordered list. The builder turns it into the
//! continuous idle and charging runs that end at the new sample, plus a short window of
//! the most recent readings for rapid-drop detection.

use super::domain::{RecentSnapshot, SnapshotHistoryEntry, TelemetrySample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of prior snapshots kept for rapid-drop detection.
pub const RECENT_WINDOW_SIZE: usize = 5;

/// The new sample together with everything derived from its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    pub telemetry: TelemetrySample,
    pub idle_duration_minutes: f64,
    pub charging_duration_minutes: f64,
    pub charge_delta_during_charge: f64,
    pub recent_snapshots: Vec<RecentSnapshot>,
}

impl EvaluationContext {
    /// Context with no temporal history behind the sample.
    pub fn without_history(telemetry: TelemetrySample) -> Self {
        Self {
            telemetry,
            idle_duration_minutes: 0.0,
            charging_duration_minutes: 0.0,
            charge_delta_during_charge: 0.0,
            recent_snapshots: Vec::new(),
        }
    }
}

/// Build the evaluation context for `sample` from prior snapshots of the same vehicle.
pub fn build_evaluation_context(
    sample: &TelemetrySample,
    history: &[SnapshotHistoryEntry],
) -> EvaluationContext {
    let chronological = chronological_history(history, sample.snapshot_timestamp);
    if chronological.is_empty() {
        return EvaluationContext::without_history(sample.clone());
    }

    let idle_duration_minutes = idle_duration(sample, &chronological);
    let charging = charging_run(sample, &chronological);

    let window_start = chronological.len().saturating_sub(RECENT_WINDOW_SIZE);
    let recent_snapshots = chronological[window_start..]
        .iter()
        .map(RecentSnapshot::from)
        .collect();

    EvaluationContext {
        telemetry: sample.clone(),
        idle_duration_minutes,
        charging_duration_minutes: charging.duration_minutes,
        charge_delta_during_charge: charging.delta_percentage,
        recent_snapshots,
    }
}

fn chronological_history(
    history: &[SnapshotHistoryEntry],
    current: DateTime<Utc>,
) -> Vec<SnapshotHistoryEntry> {
    let mut entries: Vec<SnapshotHistoryEntry> = history
        .iter()
        .filter(|entry| entry.snapshot_timestamp < current)
        .copied()
        .collect();
    entries.sort_by_key(|entry| entry.snapshot_timestamp);
    entries
}

fn minutes_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 60_000.0
}

fn idle_duration(sample: &TelemetrySample, chronological: &[SnapshotHistoryEntry]) -> f64 {
    if !sample.is_idling() {
        return 0.0;
    }

    let mut cursor = sample.snapshot_timestamp;
    let mut minutes = 0.0;

    for entry in chronological.iter().rev() {
        if !entry.is_idling() {
            break;
        }
        minutes += minutes_between(cursor, entry.snapshot_timestamp);
        cursor = entry.snapshot_timestamp;
    }

    minutes.max(0.0)
}

struct ChargingRun {
    duration_minutes: f64,
    delta_percentage: f64,
}

fn charging_run(sample: &TelemetrySample, chronological: &[SnapshotHistoryEntry]) -> ChargingRun {
    if !sample.charging {
        return ChargingRun {
            duration_minutes: 0.0,
            delta_percentage: 0.0,
        };
    }

    let mut cursor = sample.snapshot_timestamp;
    let mut minutes = 0.0;
    let mut start_battery = sample.battery_percentage;

    for entry in chronological.iter().rev() {
        if !entry.charging {
            break;
        }
        minutes += minutes_between(cursor, entry.snapshot_timestamp);
        cursor = entry.snapshot_timestamp;
        start_battery = entry.battery_percentage;
    }

    ChargingRun {
        duration_minutes: minutes.max(0.0),
        delta_percentage: (sample.battery_percentage - start_battery).max(0.0),
    }
}
