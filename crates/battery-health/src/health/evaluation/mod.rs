mod config;
mod rules;
mod status;

pub use config::{
    DeepDischargeParameters, IdleDrainParameters, RapidDropParameters, RuleParameters,
    RuleParametersError, SlowChargeParameters, StatusBand, TemperatureParameters,
};

use super::context::EvaluationContext;
use super::domain::{HealthStatus, RuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form metadata attached to a triggered rule, ordered by key.
pub type RuleMetadata = BTreeMap<String, serde_json::Value>;

/// Stateless evaluator applying a rule parameter set to an evaluation context.
#[derive(Debug, Clone)]
pub struct BatteryHealthEngine {
    parameters: RuleParameters,
}

impl BatteryHealthEngine {
    pub fn new(mut parameters: RuleParameters) -> Self {
        parameters.status_bands = status::descending_bands(&parameters.status_bands);
        Self { parameters }
    }

    pub fn parameters(&self) -> &RuleParameters {
        &self.parameters
    }

    pub fn evaluate(&self, context: &EvaluationContext) -> EvaluationResult {
        let (rule_impacts, total_deduction) = rules::score_context(context, &self.parameters);

        let base_score = self.parameters.base_score;
        let score = (base_score - total_deduction).max(0.0);
        let status = status::determine_status(score, &self.parameters.status_bands);

        EvaluationResult {
            base_score,
            score,
            status,
            rule_impacts,
        }
    }

    pub fn status_for(&self, score: f64) -> HealthStatus {
        status::determine_status(score, &self.parameters.status_bands)
    }
}

impl Default for BatteryHealthEngine {
    fn default() -> Self {
        Self::new(RuleParameters::default())
    }
}

/// A triggered scoring rule with its deduction and rendering metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleImpact {
    pub id: RuleId,
    pub deduction: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: RuleMetadata,
}

impl RuleImpact {
    pub fn new(id: RuleId, deduction: f64) -> Self {
        Self {
            id,
            deduction,
            metadata: RuleMetadata::new(),
        }
    }

    pub fn with(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Evaluation output; impacts are listed in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub base_score: f64,
    pub score: f64,
    pub status: HealthStatus,
    pub rule_impacts: Vec<RuleImpact>,
}

impl EvaluationResult {
    pub fn triggered_rules(&self) -> Vec<RuleId> {
        self.rule_impacts.iter().map(|impact| impact.id).collect()
    }

    pub fn total_deduction(&self) -> f64 {
        self.rule_impacts.iter().map(|impact| impact.deduction).sum()
    }
}

/// Evaluate `context` against `parameters` without keeping an engine around.
pub fn evaluate_battery_health(
    context: &EvaluationContext,
    parameters: &RuleParameters,
) -> EvaluationResult {
    BatteryHealthEngine::new(parameters.clone()).evaluate(context)
}
