use super::super::domain::HealthStatus;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Versioned rule parameters driving the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleParameters {
    pub version: String,
    pub base_score: f64,
    pub status_bands: Vec<StatusBand>,
    pub deep_discharge: DeepDischargeParameters,
    pub idle_drain: IdleDrainParameters,
    pub rapid_drop: RapidDropParameters,
    pub temperature: TemperatureParameters,
    pub slow_charge: SlowChargeParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBand {
    pub threshold: f64,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeepDischargeParameters {
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub warning_deduction: f64,
    pub critical_deduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdleDrainParameters {
    pub interval_minutes: f64,
    pub per_interval_deduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RapidDropParameters {
    pub window_minutes: f64,
    pub drop_threshold: f64,
    pub deduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemperatureParameters {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub high_deduction: f64,
    pub low_deduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlowChargeParameters {
    pub min_duration_minutes: f64,
    pub min_rate_percentage: f64,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            version: "2024-01".to_string(),
            base_score: 100.0,
            status_bands: vec![
                StatusBand {
                    threshold: 80.0,
                    status: HealthStatus::Good,
                },
                StatusBand {
                    threshold: 60.0,
                    status: HealthStatus::Moderate,
                },
                StatusBand {
                    threshold: 0.0,
                    status: HealthStatus::Poor,
                },
            ],
            deep_discharge: DeepDischargeParameters::default(),
            idle_drain: IdleDrainParameters::default(),
            rapid_drop: RapidDropParameters::default(),
            temperature: TemperatureParameters::default(),
            slow_charge: SlowChargeParameters::default(),
        }
    }
}

impl Default for DeepDischargeParameters {
    fn default() -> Self {
        Self {
            warning_threshold: 20.0,
            critical_threshold: 10.0,
            warning_deduction: 5.0,
            critical_deduction: 10.0,
        }
    }
}

impl Default for IdleDrainParameters {
    fn default() -> Self {
        Self {
            interval_minutes: 10.0,
            per_interval_deduction: 3.0,
        }
    }
}

impl Default for RapidDropParameters {
    fn default() -> Self {
        Self {
            window_minutes: 15.0,
            drop_threshold: 15.0,
            deduction: 4.0,
        }
    }
}

impl Default for TemperatureParameters {
    fn default() -> Self {
        Self {
            high_threshold: 40.0,
            low_threshold: 0.0,
            high_deduction: 2.0,
            low_deduction: 1.0,
        }
    }
}

impl Default for SlowChargeParameters {
    fn default() -> Self {
        Self {
            min_duration_minutes: 20.0,
            min_rate_percentage: 5.0,
        }
    }
}

/// Failure to load or accept a rule parameter set.
#[derive(Debug, thiserror::Error)]
pub enum RuleParametersError {
    #[error("failed to read rule parameters: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule parameter JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule parameters rejected: {0}")]
    Invalid(String),
}

impl RuleParameters {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleParametersError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse JSON parameters; omitted sections and fields fall back to the defaults.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleParametersError> {
        let parameters: Self = serde_json::from_reader(reader)?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<(), RuleParametersError> {
        let numbers = [
            ("baseScore", self.base_score),
            ("deepDischarge.warningThreshold", self.deep_discharge.warning_threshold),
            ("deepDischarge.criticalThreshold", self.deep_discharge.critical_threshold),
            ("deepDischarge.warningDeduction", self.deep_discharge.warning_deduction),
            ("deepDischarge.criticalDeduction", self.deep_discharge.critical_deduction),
            ("idleDrain.intervalMinutes", self.idle_drain.interval_minutes),
            ("idleDrain.perIntervalDeduction", self.idle_drain.per_interval_deduction),
            ("rapidDrop.windowMinutes", self.rapid_drop.window_minutes),
            ("rapidDrop.dropThreshold", self.rapid_drop.drop_threshold),
            ("rapidDrop.deduction", self.rapid_drop.deduction),
            ("temperature.highThreshold", self.temperature.high_threshold),
            ("temperature.lowThreshold", self.temperature.low_threshold),
            ("temperature.highDeduction", self.temperature.high_deduction),
            ("temperature.lowDeduction", self.temperature.low_deduction),
            ("slowCharge.minDurationMinutes", self.slow_charge.min_duration_minutes),
            ("slowCharge.minRatePercentage", self.slow_charge.min_rate_percentage),
        ];

        if let Some((name, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(format!("{name} must be a finite number")));
        }

        if self.base_score <= 0.0 {
            return Err(invalid("baseScore must be positive"));
        }

        if self.status_bands.is_empty() {
            return Err(invalid("at least one status band is required"));
        }

        if self
            .status_bands
            .iter()
            .any(|band| !band.threshold.is_finite())
        {
            return Err(invalid("status band thresholds must be finite"));
        }

        if self.deep_discharge.critical_threshold >= self.deep_discharge.warning_threshold {
            return Err(invalid(
                "deepDischarge.criticalThreshold must be below warningThreshold",
            ));
        }

        if self.idle_drain.interval_minutes <= 0.0 {
            return Err(invalid("idleDrain.intervalMinutes must be positive"));
        }

        if self.rapid_drop.window_minutes <= 0.0 {
            return Err(invalid("rapidDrop.windowMinutes must be positive"));
        }

        if self.slow_charge.min_duration_minutes <= 0.0 {
            return Err(invalid("slowCharge.minDurationMinutes must be positive"));
        }

        if self.temperature.low_threshold >= self.temperature.high_threshold {
            return Err(invalid(
                "temperature.lowThreshold must be below highThreshold",
            ));
        }

        let deductions = [
            self.deep_discharge.warning_deduction,
            self.deep_discharge.critical_deduction,
            self.idle_drain.per_interval_deduction,
            self.rapid_drop.deduction,
            self.temperature.high_deduction,
            self.temperature.low_deduction,
        ];
        if deductions.iter().any(|deduction| *deduction < 0.0) {
            return Err(invalid("deductions cannot be negative"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> RuleParametersError {
    RuleParametersError::Invalid(message.into())
}
