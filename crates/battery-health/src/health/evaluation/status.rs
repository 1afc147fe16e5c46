use super::super::domain::HealthStatus;
use super::config::StatusBand;

/// Sort bands so the highest threshold is checked first.
pub(crate) fn descending_bands(bands: &[StatusBand]) -> Vec<StatusBand> {
    let mut ordered = bands.to_vec();
    ordered.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
    ordered
}

/// First band whose threshold the score reaches; the lowest band otherwise.
///
/// `bands` must already be in descending threshold order.
pub(crate) fn determine_status(score: f64, bands: &[StatusBand]) -> HealthStatus {
    bands
        .iter()
        .find(|band| score >= band.threshold)
        .or_else(|| bands.last())
        .map(|band| band.status)
        .unwrap_or(HealthStatus::Poor)
}
