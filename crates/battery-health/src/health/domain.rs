use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the vehicle a sample belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One validated telemetry reading for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub vehicle_id: VehicleId,
    pub snapshot_timestamp: DateTime<Utc>,
    pub battery_percentage: f64,
    pub speed_kmph: f64,
    pub engine_on: bool,
    pub charging: bool,
    pub ambient_temperature: Option<f64>,
    pub odometer_km: Option<f64>,
}

impl TelemetrySample {
    /// Engine running while stationary.
    pub fn is_idling(&self) -> bool {
        self.engine_on && self.speed_kmph == 0.0
    }

    pub fn history_entry(&self) -> SnapshotHistoryEntry {
        SnapshotHistoryEntry {
            snapshot_timestamp: self.snapshot_timestamp,
            battery_percentage: self.battery_percentage,
            speed_kmph: self.speed_kmph,
            engine_on: self.engine_on,
            charging: self.charging,
        }
    }
}

/// Prior sample reduced to the fields needed for temporal reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHistoryEntry {
    pub snapshot_timestamp: DateTime<Utc>,
    pub battery_percentage: f64,
    pub speed_kmph: f64,
    pub engine_on: bool,
    pub charging: bool,
}

impl SnapshotHistoryEntry {
    pub fn is_idling(&self) -> bool {
        self.engine_on && self.speed_kmph == 0.0
    }
}

/// Entry of the rapid-drop window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSnapshot {
    pub snapshot_timestamp: DateTime<Utc>,
    pub battery_percentage: f64,
}

impl From<&SnapshotHistoryEntry> for RecentSnapshot {
    fn from(entry: &SnapshotHistoryEntry) -> Self {
        Self {
            snapshot_timestamp: entry.snapshot_timestamp,
            battery_percentage: entry.battery_percentage,
        }
    }
}

/// Coarse health category derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Good,
    Moderate,
    Poor,
}

impl HealthStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Moderate => "MODERATE",
            Self::Poor => "POOR",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scoring rules the engine can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    DeepDischargeWarning,
    DeepDischargeCritical,
    IdleDrain,
    RapidDrop,
    SlowCharge,
    TemperatureHigh,
    TemperatureLow,
}

impl RuleId {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::DeepDischargeWarning,
            Self::DeepDischargeCritical,
            Self::IdleDrain,
            Self::RapidDrop,
            Self::SlowCharge,
            Self::TemperatureHigh,
            Self::TemperatureLow,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeepDischargeWarning => "deep_discharge_warning",
            Self::DeepDischargeCritical => "deep_discharge_critical",
            Self::IdleDrain => "idle_drain",
            Self::RapidDrop => "rapid_drop",
            Self::SlowCharge => "slow_charge",
            Self::TemperatureHigh => "temperature_high",
            Self::TemperatureLow => "temperature_low",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule id '{0}'")]
pub struct UnknownRuleId(pub String);

impl FromStr for RuleId {
    type Err = UnknownRuleId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|id| id.as_str() == trimmed)
            .ok_or_else(|| UnknownRuleId(trimmed.to_string()))
    }
}

/// Alert urgency shown to drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}
