//! 0-100 risk index over a report set.

use std::collections::BTreeMap;

use incident_map_analytics_models::{ClusteringResult, RiskAssessment, RiskLevel, RiskWeights};
use incident_map_report_models::{Report, ReportStatus};

/// Scores `reports` given their clustering.
///
/// The index is `pending_ratio * pending + density * density_weight +
/// min(n / saturation, 1) * volume`, rounded and clamped to 0-100, where
/// `density` is the largest cluster's share of all reports. An empty
/// report set scores 0 with an unknown level.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_risk(
    reports: &[Report],
    clustering: &ClusteringResult,
    weights: &RiskWeights,
) -> RiskAssessment {
    if reports.is_empty() {
        return RiskAssessment::unknown();
    }

    let mut by_type = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    for report in reports {
        *by_type.entry(report.report_type).or_insert(0) += 1;
        *by_status.entry(report.status).or_insert(0) += 1;
    }

    let total = reports.len() as f64;
    let pending = by_status.get(&ReportStatus::Pending).copied().unwrap_or(0) as f64;
    let pending_ratio = pending / total;
    let density = clustering.largest_cluster_size() as f64 / total;
    let volume = if weights.volume_saturation > 0.0 {
        (total / weights.volume_saturation).min(1.0)
    } else {
        1.0
    };

    let raw = weights.volume.mul_add(
        volume,
        pending_ratio.mul_add(weights.pending, density * weights.density),
    );
    let overall = raw.round().clamp(0.0, 100.0) as u8;

    RiskAssessment {
        overall,
        risk_level: risk_level(overall, weights),
        by_type,
        by_status,
    }
}

/// Buckets a risk index: below `medium_from` is low, above `high_above` is
/// high, anything in between (inclusive) is medium.
#[must_use]
pub const fn risk_level(index: u8, weights: &RiskWeights) -> RiskLevel {
    if index > weights.high_above {
        RiskLevel::High
    } else if index >= weights.medium_from {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use incident_map_analytics_models::{Cluster, GeoPoint};
    use incident_map_report_models::{Location, ReportType};

    use super::*;

    fn report(id: usize, status: ReportStatus) -> Report {
        Report {
            id: format!("r{id}"),
            report_type: ReportType::Police,
            location: Location::real(1.0, 1.0),
            status,
            severity: None,
            description: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn clustering_with_sizes(sizes: &[usize]) -> ClusteringResult {
        let mut next = 0;
        let clusters = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let members = (next..next + size).map(|m| format!("r{m}")).collect();
                next += size;
                Cluster {
                    id: i + 1,
                    members,
                    centroid: GeoPoint {
                        latitude: 1.0,
                        longitude: 1.0,
                    },
                    severity: 2.5,
                    type_histogram: BTreeMap::new(),
                }
            })
            .collect();
        ClusteringResult {
            clusters,
            noise: vec![],
        }
    }

    #[test]
    fn empty_input_is_unknown() {
        let risk = score_risk(&[], &ClusteringResult::default(), &RiskWeights::default());
        assert_eq!(risk, RiskAssessment::unknown());
    }

    #[test]
    fn single_resolved_report_is_low() {
        let reports = vec![report(0, ReportStatus::Resolved)];
        let risk = score_risk(&reports, &ClusteringResult::default(), &RiskWeights::default());
        assert_eq!(risk.overall, 2);
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert_eq!(risk.by_status.get(&ReportStatus::Resolved), Some(&1));
    }

    #[test]
    fn all_pending_in_one_cluster_saturates() {
        let reports: Vec<Report> = (0..12).map(|i| report(i, ReportStatus::Pending)).collect();
        let risk = score_risk(&reports, &clustering_with_sizes(&[12]), &RiskWeights::default());
        assert_eq!(risk.overall, 100);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert_eq!(risk.by_type.get(&ReportType::Police), Some(&12));
    }

    #[test]
    fn mixed_input_matches_formula() {
        // 5 reports, 3 pending, largest cluster 2:
        // 0.6*40 + 0.4*40 + 0.5*20 = 24 + 16 + 10 = 50
        let reports = vec![
            report(0, ReportStatus::Pending),
            report(1, ReportStatus::Pending),
            report(2, ReportStatus::Pending),
            report(3, ReportStatus::InProgress),
            report(4, ReportStatus::Resolved),
        ];
        let risk = score_risk(&reports, &clustering_with_sizes(&[2]), &RiskWeights::default());
        assert_eq!(risk.overall, 50);
        assert_eq!(risk.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn index_stays_within_bounds() {
        for n in 1..40 {
            for pending in [0, n / 2, n] {
                let reports: Vec<Report> = (0..n)
                    .map(|i| {
                        report(
                            i,
                            if i < pending {
                                ReportStatus::Pending
                            } else {
                                ReportStatus::Resolved
                            },
                        )
                    })
                    .collect();
                for sizes in [vec![], vec![n], vec![n / 2, n - n / 2]] {
                    let risk = score_risk(&reports, &clustering_with_sizes(&sizes), &RiskWeights::default());
                    assert!(risk.overall <= 100);
                    assert_ne!(risk.risk_level, RiskLevel::Unknown);
                }
            }
        }
    }

    #[test]
    fn thresholds_are_inclusive_for_medium() {
        let w = RiskWeights::default();
        assert_eq!(risk_level(39, &w), RiskLevel::Low);
        assert_eq!(risk_level(40, &w), RiskLevel::Medium);
        assert_eq!(risk_level(70, &w), RiskLevel::Medium);
        assert_eq!(risk_level(71, &w), RiskLevel::High);
        assert_eq!(risk_level(0, &w), RiskLevel::Low);
    }
}
