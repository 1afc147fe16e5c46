use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::health::context::EvaluationContext;
use crate::health::domain::{RecentSnapshot, TelemetrySample, VehicleId};
use crate::health::evaluation::{BatteryHealthEngine, RuleParameters};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// A healthy vehicle cruising in mild weather; triggers no rules on its own.
pub(super) fn cruising_sample() -> TelemetrySample {
    TelemetrySample {
        vehicle_id: VehicleId::from("veh-test"),
        snapshot_timestamp: base_time(),
        battery_percentage: 75.0,
        speed_kmph: 48.0,
        engine_on: true,
        charging: false,
        ambient_temperature: Some(21.0),
        odometer_km: Some(12_400.0),
    }
}

pub(super) fn idling_sample() -> TelemetrySample {
    TelemetrySample {
        speed_kmph: 0.0,
        ..cruising_sample()
    }
}

pub(super) fn charging_sample() -> TelemetrySample {
    TelemetrySample {
        speed_kmph: 0.0,
        engine_on: false,
        charging: true,
        ..cruising_sample()
    }
}

pub(super) fn context_for(sample: TelemetrySample) -> EvaluationContext {
    EvaluationContext::without_history(sample)
}

pub(super) fn snapshot_minutes_before(minutes: i64, battery: f64) -> RecentSnapshot {
    RecentSnapshot {
        snapshot_timestamp: base_time() - Duration::minutes(minutes),
        battery_percentage: battery,
    }
}

pub(super) fn engine() -> BatteryHealthEngine {
    BatteryHealthEngine::new(RuleParameters::default())
}
