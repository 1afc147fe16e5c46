use battery_health::error::AppError;
use battery_health::health::{
    alerts_from_impacts, build_evaluation_context, tips_from_impacts, BatteryHealthEngine,
    RuleParameters, SnapshotHistoryEntry,
};
use battery_health::ingest::{SnapshotHistoryImporter, TelemetryPayload};
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON telemetry sample in the ingest payload shape
    #[arg(long)]
    pub(crate) sample: PathBuf,
    /// Optional CSV export of earlier snapshots for the same vehicle
    #[arg(long)]
    pub(crate) history_csv: Option<PathBuf>,
    /// Optional JSON rule parameters (defaults otherwise)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Emit the evaluation as JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// Optional JSON rule parameters to validate and print
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

pub(crate) fn load_parameters(path: Option<&Path>) -> Result<RuleParameters, AppError> {
    match path {
        Some(path) => Ok(RuleParameters::from_path(path)?),
        None => Ok(RuleParameters::default()),
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        sample,
        history_csv,
        rules,
        json,
    } = args;

    let parameters = load_parameters(rules.as_deref())?;
    let payload: TelemetryPayload = serde_json::from_reader(std::fs::File::open(sample)?)?;
    let sample = payload.validate()?;

    let history: Vec<SnapshotHistoryEntry> = match history_csv {
        Some(path) => SnapshotHistoryImporter::from_path(path, Some(sample.vehicle_id.as_str()))?,
        None => Vec::new(),
    };

    let engine = BatteryHealthEngine::new(parameters);
    let context = build_evaluation_context(&sample, &history);
    let evaluation = engine.evaluate(&context);
    let alerts = alerts_from_impacts(&evaluation.rule_impacts);
    let tips = tips_from_impacts(&evaluation.rule_impacts);

    if json {
        let body = json!({
            "vehicleId": sample.vehicle_id,
            "score": evaluation.score,
            "status": evaluation.status,
            "baseScore": evaluation.base_score,
            "ruleImpacts": evaluation.rule_impacts,
            "alerts": alerts,
            "tips": tips,
            "context": {
                "idleDurationMinutes": context.idle_duration_minutes,
                "chargingDurationMinutes": context.charging_duration_minutes,
                "chargeDeltaDuringCharge": context.charge_delta_during_charge,
                "recentSnapshots": context.recent_snapshots.len(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Battery health for {}", sample.vehicle_id);
    println!(
        "Score {:.1} / {:.1} -> {} (rules {})",
        evaluation.score,
        evaluation.base_score,
        evaluation.status,
        engine.parameters().version
    );
    println!(
        "History: {} prior snapshot(s) | idle {:.1} min | charging {:.1} min (+{:.1}%)",
        history.len(),
        context.idle_duration_minutes,
        context.charging_duration_minutes,
        context.charge_delta_during_charge
    );

    if evaluation.rule_impacts.is_empty() {
        println!("No rules triggered.");
        return Ok(());
    }

    println!("Rule impacts:");
    for impact in &evaluation.rule_impacts {
        println!("  - {}: -{:.1}", impact.id, impact.deduction);
    }
    println!("Alerts:");
    for alert in &alerts {
        println!(
            "  - [{}] {}: {}",
            alert.severity.label(),
            alert.title,
            alert.message
        );
    }
    println!("Tips:");
    for tip in &tips {
        println!("  - {}", tip.message);
    }

    Ok(())
}

pub(crate) fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let parameters = load_parameters(args.rules.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&parameters)?);
    Ok(())
}
