use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::health::{TelemetrySample, VehicleId};

/// Raw telemetry as submitted by clients, before range and timestamp checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub vehicle_id: String,
    pub timestamp: String,
    pub battery_percentage: f64,
    pub speed_kmph: f64,
    pub engine_on: bool,
    pub charging: bool,
    #[serde(default)]
    pub ambient_temperature: Option<f64>,
    #[serde(default)]
    pub odometer_km: Option<f64>,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("telemetry payload failed validation ({} issue(s))", .issues.len())]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl TelemetryPayload {
    /// Check ranges and normalize the timestamp to UTC, collecting every violation.
    pub fn validate(self) -> Result<TelemetrySample, ValidationError> {
        let mut issues = Vec::new();
        let mut reject = |field: &'static str, message: &str| {
            issues.push(FieldIssue {
                field,
                message: message.to_string(),
            })
        };

        let vehicle_id = self.vehicle_id.trim().to_string();
        if vehicle_id.is_empty() {
            reject("vehicleId", "vehicleId is required");
        }

        let timestamp = parse_timestamp(&self.timestamp);
        if timestamp.is_none() {
            reject("timestamp", "timestamp must be ISO-8601");
        }

        if !(0.0..=100.0).contains(&self.battery_percentage) {
            reject("batteryPercentage", "must be between 0 and 100");
        }

        if !self.speed_kmph.is_finite() || self.speed_kmph < 0.0 {
            reject("speedKmph", "must be zero or greater");
        }

        if self
            .ambient_temperature
            .is_some_and(|temperature| !temperature.is_finite())
        {
            reject("ambientTemperature", "must be a finite number");
        }

        if self
            .odometer_km
            .is_some_and(|odometer| !odometer.is_finite() || odometer < 0.0)
        {
            reject("odometerKm", "must be zero or greater");
        }

        match timestamp {
            Some(snapshot_timestamp) if issues.is_empty() => Ok(TelemetrySample {
                vehicle_id: VehicleId(vehicle_id),
                snapshot_timestamp,
                battery_percentage: self.battery_percentage,
                speed_kmph: self.speed_kmph,
                engine_on: self.engine_on,
                charging: self.charging,
                ambient_temperature: self.ambient_temperature,
                odometer_km: self.odometer_km,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}
