use super::super::context::EvaluationContext;
use super::super::domain::{RuleId, TelemetrySample};
use super::config::RuleParameters;
use super::RuleImpact;
use serde_json::json;

/// Apply every rule in evaluation order, returning the triggered impacts and their total.
pub(crate) fn score_context(
    context: &EvaluationContext,
    parameters: &RuleParameters,
) -> (Vec<RuleImpact>, f64) {
    let telemetry = &context.telemetry;

    let impacts: Vec<RuleImpact> = [
        deep_discharge(telemetry, parameters),
        idle_drain(telemetry, context, parameters),
        rapid_drop(telemetry, context, parameters),
        temperature(telemetry, parameters),
        slow_charge(telemetry, context, parameters),
    ]
    .into_iter()
    .flatten()
    .collect();

    let total_deduction = impacts.iter().map(|impact| impact.deduction).sum();
    (impacts, total_deduction)
}

fn deep_discharge(telemetry: &TelemetrySample, parameters: &RuleParameters) -> Option<RuleImpact> {
    let rule = &parameters.deep_discharge;
    let battery = telemetry.battery_percentage;

    let (id, deduction) = if battery < rule.critical_threshold {
        (RuleId::DeepDischargeCritical, rule.critical_deduction)
    } else if battery < rule.warning_threshold {
        (RuleId::DeepDischargeWarning, rule.warning_deduction)
    } else {
        return None;
    };

    Some(RuleImpact::new(id, deduction).with("batteryPercentage", json!(battery)))
}

fn idle_drain(
    telemetry: &TelemetrySample,
    context: &EvaluationContext,
    parameters: &RuleParameters,
) -> Option<RuleImpact> {
    let rule = &parameters.idle_drain;
    if !telemetry.is_idling() || rule.interval_minutes <= 0.0 {
        return None;
    }

    let duration = context.idle_duration_minutes;
    let intervals = (duration / rule.interval_minutes).floor();
    if intervals <= 0.0 {
        return None;
    }

    Some(
        RuleImpact::new(RuleId::IdleDrain, intervals * rule.per_interval_deduction)
            .with("idleDurationMinutes", json!(duration))
            .with("intervals", json!(intervals as u64)),
    )
}

fn rapid_drop(
    telemetry: &TelemetrySample,
    context: &EvaluationContext,
    parameters: &RuleParameters,
) -> Option<RuleImpact> {
    let rule = &parameters.rapid_drop;
    if context.recent_snapshots.is_empty() {
        return None;
    }

    let window_millis = (rule.window_minutes * 60_000.0) as i64;
    let current = telemetry.snapshot_timestamp;

    let candidate_max = context
        .recent_snapshots
        .iter()
        .filter(|snapshot| {
            (current - snapshot.snapshot_timestamp)
                .num_milliseconds()
                .abs()
                <= window_millis
        })
        .map(|snapshot| snapshot.battery_percentage)
        .fold(telemetry.battery_percentage, f64::max);

    let drop = candidate_max - telemetry.battery_percentage;
    if drop < rule.drop_threshold {
        return None;
    }

    Some(
        RuleImpact::new(RuleId::RapidDrop, rule.deduction)
            .with("drop", json!(drop))
            .with("windowMinutes", json!(rule.window_minutes)),
    )
}

fn temperature(telemetry: &TelemetrySample, parameters: &RuleParameters) -> Option<RuleImpact> {
    let rule = &parameters.temperature;
    let ambient = telemetry.ambient_temperature?;

    let (id, deduction) = if ambient > rule.high_threshold {
        (RuleId::TemperatureHigh, rule.high_deduction)
    } else if ambient < rule.low_threshold {
        (RuleId::TemperatureLow, rule.low_deduction)
    } else {
        return None;
    };

    Some(RuleImpact::new(id, deduction).with("ambientTemperature", json!(ambient)))
}

// Informational: reports a charger-health signal without touching the score.
fn slow_charge(
    telemetry: &TelemetrySample,
    context: &EvaluationContext,
    parameters: &RuleParameters,
) -> Option<RuleImpact> {
    let rule = &parameters.slow_charge;
    if !telemetry.charging {
        return None;
    }

    let duration = context.charging_duration_minutes;
    let delta = context.charge_delta_during_charge;

    if duration < rule.min_duration_minutes || delta >= rule.min_rate_percentage {
        return None;
    }

    Some(
        RuleImpact::new(RuleId::SlowCharge, 0.0)
            .with("durationMinutes", json!(duration))
            .with("progressDelta", json!(delta)),
    )
}
