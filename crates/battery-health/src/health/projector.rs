//! Driver-facing alerts and tips for triggered rules.

use super::domain::{AlertSeverity, RuleId};
use super::evaluation::{RuleImpact, RuleMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTemplate {
    pub title: &'static str,
    pub message: &'static str,
    pub severity: AlertSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipTemplate {
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: RuleId,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: RuleMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverTip {
    pub id: RuleId,
    pub message: String,
}

const ALERTS: &[(RuleId, AlertTemplate)] = &[
    (
        RuleId::DeepDischargeWarning,
        AlertTemplate {
            title: "Battery charge low",
            message: "Battery level fell below 20%. Sustained deep discharge accelerates degradation.",
            severity: AlertSeverity::Warning,
        },
    ),
    (
        RuleId::DeepDischargeCritical,
        AlertTemplate {
            title: "Battery critically low",
            message: "State of charge is under 10%. Charge immediately to avoid shutdown.",
            severity: AlertSeverity::Critical,
        },
    ),
    (
        RuleId::IdleDrain,
        AlertTemplate {
            title: "Extended idling detected",
            message: "Vehicle remained on with no movement for an extended time, increasing drain.",
            severity: AlertSeverity::Warning,
        },
    ),
    (
        RuleId::RapidDrop,
        AlertTemplate {
            title: "Rapid charge depletion",
            message: "Battery percentage fell sharply within minutes, indicating aggressive driving or load.",
            severity: AlertSeverity::Warning,
        },
    ),
    (
        RuleId::SlowCharge,
        AlertTemplate {
            title: "Slow charging observed",
            message: "Charging progress is below expected levels; check charger health or connection.",
            severity: AlertSeverity::Info,
        },
    ),
    (
        RuleId::TemperatureHigh,
        AlertTemplate {
            title: "High temperature risk",
            message: "Ambient temperatures above 40°C can degrade the battery faster.",
            severity: AlertSeverity::Warning,
        },
    ),
    (
        RuleId::TemperatureLow,
        AlertTemplate {
            title: "Low temperature effect",
            message: "Cold weather reduces performance; pre-condition the cabin before driving.",
            severity: AlertSeverity::Info,
        },
    ),
];

const TIPS: &[(RuleId, TipTemplate)] = &[
    (
        RuleId::DeepDischargeWarning,
        TipTemplate {
            message: "Charge before dropping under 20% to protect long-term capacity.",
        },
    ),
    (
        RuleId::DeepDischargeCritical,
        TipTemplate {
            message: "Avoid driving with less than 10% charge; schedule charging stops earlier.",
        },
    ),
    (
        RuleId::IdleDrain,
        TipTemplate {
            message: "Switch off the vehicle or enable eco-idle features when stationary to prevent waste.",
        },
    ),
    (
        RuleId::RapidDrop,
        TipTemplate {
            message: "Adopt smoother acceleration and deceleration to maintain efficient energy usage.",
        },
    ),
    (
        RuleId::SlowCharge,
        TipTemplate {
            message: "Inspect charging equipment and prefer faster AC/DC chargers when available.",
        },
    ),
    (
        RuleId::TemperatureHigh,
        TipTemplate {
            message: "Park in shaded areas and avoid fast charging during extreme heat.",
        },
    ),
    (
        RuleId::TemperatureLow,
        TipTemplate {
            message: "Pre-heat the vehicle while plugged in to protect the battery in cold conditions.",
        },
    ),
];

pub fn alert_template(id: RuleId) -> Option<&'static AlertTemplate> {
    ALERTS
        .iter()
        .find(|(rule, _)| *rule == id)
        .map(|(_, template)| template)
}

pub fn tip_template(id: RuleId) -> Option<&'static TipTemplate> {
    TIPS.iter()
        .find(|(rule, _)| *rule == id)
        .map(|(_, template)| template)
}

pub fn alerts_from_impacts(impacts: &[RuleImpact]) -> Vec<Alert> {
    impacts
        .iter()
        .filter_map(|impact| {
            alert_template(impact.id).map(|template| Alert {
                id: impact.id,
                title: template.title.to_string(),
                message: template.message.to_string(),
                severity: template.severity,
                metadata: impact.metadata.clone(),
            })
        })
        .collect()
}

pub fn tips_from_impacts(impacts: &[RuleImpact]) -> Vec<DriverTip> {
    impacts
        .iter()
        .filter_map(|impact| {
            tip_template(impact.id).map(|template| DriverTip {
                id: impact.id,
                message: template.message.to_string(),
            })
        })
        .collect()
}
