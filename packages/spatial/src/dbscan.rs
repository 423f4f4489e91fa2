//! DBSCAN clustering of incident reports.
//!
//! Clusters are discovered in input order: the first unvisited core point
//! seeds cluster 1, and so on. Membership is grown breadth-first through
//! density-reachable points. A point first marked as noise is absorbed as
//! a border point if a later expansion reaches it.

use std::collections::{BTreeMap, VecDeque};

use geo::{Centroid, MultiPoint, Point};
use incident_map_analytics_models::{
    Cluster, ClusteringResult, DbscanParams, GeoPoint, SeverityWeights,
};
use incident_map_report_models::{Report, ReportSeverity, ReportStatus};

use crate::index::PointIndex;
use crate::{DroppedReport, LocatedReport, partition_located};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

/// Output of [`ClusterEngine::cluster`].
#[derive(Debug, Clone, Default)]
pub struct ClusterOutput {
    /// Clusters and noise over the valid-location reports.
    pub result: ClusteringResult,
    /// Reports excluded before clustering, with the reason.
    pub dropped: Vec<DroppedReport>,
}

/// DBSCAN over report coordinates with severity scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterEngine {
    params: DbscanParams,
    weights: SeverityWeights,
}

impl ClusterEngine {
    /// Creates an engine with explicit parameters.
    #[must_use]
    pub const fn new(params: DbscanParams, weights: SeverityWeights) -> Self {
        Self { params, weights }
    }

    /// The DBSCAN parameters in use.
    #[must_use]
    pub const fn params(&self) -> DbscanParams {
        self.params
    }

    /// Clusters the reports that carry a real, finite location.
    ///
    /// Reports without one are excluded entirely (they are neither
    /// clustered nor noise) and listed in [`ClusterOutput::dropped`].
    #[must_use]
    pub fn cluster(&self, reports: &[Report]) -> ClusterOutput {
        let (located, dropped) = partition_located(reports);
        ClusterOutput {
            result: self.cluster_located(&located),
            dropped,
        }
    }

    /// Clusters reports whose locations were already validated with
    /// [`partition_located`].
    #[must_use]
    pub fn cluster_located(&self, located: &[LocatedReport<'_>]) -> ClusteringResult {
        if located.is_empty() {
            return ClusteringResult::default();
        }

        let index = PointIndex::new(
            located
                .iter()
                .map(|l| (l.latitude, l.longitude))
                .collect(),
        );
        let (labels, groups) = self.label_points(&index);

        let clusters = groups
            .iter()
            .enumerate()
            .map(|(i, members)| self.build_cluster(i + 1, members, located))
            .collect::<Vec<_>>();

        let noise = labels
            .iter()
            .zip(located)
            .filter(|(label, _)| **label == Label::Noise)
            .map(|(_, l)| l.report.id.clone())
            .collect::<Vec<_>>();

        log::debug!(
            "DBSCAN (eps={} km, minPts={}) over {} reports: {} clusters, {} noise",
            self.params.epsilon_km,
            self.params.min_points,
            located.len(),
            clusters.len(),
            noise.len()
        );

        ClusteringResult { clusters, noise }
    }

    /// Runs the density-reachability pass, returning the final label of
    /// every point and the member indices of every cluster in discovery
    /// order.
    fn label_points(&self, index: &PointIndex) -> (Vec<Label>, Vec<Vec<usize>>) {
        let eps = self.params.epsilon_km;
        let min_points = self.params.min_points;

        let mut labels = vec![Label::Unvisited; index.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for seed in 0..index.len() {
            if labels[seed] != Label::Unvisited {
                continue;
            }

            let neighbors = index.neighbors(seed, eps);
            if neighbors.len() < min_points {
                labels[seed] = Label::Noise;
                continue;
            }

            let cluster_id = groups.len();
            labels[seed] = Label::Member(cluster_id);
            let mut members = vec![seed];

            let mut frontier: VecDeque<usize> =
                neighbors.into_iter().filter(|&n| n != seed).collect();

            while let Some(point) = frontier.pop_front() {
                match labels[point] {
                    Label::Member(_) => {}
                    Label::Noise => {
                        labels[point] = Label::Member(cluster_id);
                        members.push(point);
                    }
                    Label::Unvisited => {
                        labels[point] = Label::Member(cluster_id);
                        members.push(point);

                        let reachable = index.neighbors(point, eps);
                        if reachable.len() >= min_points {
                            frontier.extend(
                                reachable
                                    .into_iter()
                                    .filter(|&n| !matches!(labels[n], Label::Member(_))),
                            );
                        }
                    }
                }
            }

            groups.push(members);
        }

        (labels, groups)
    }

    fn build_cluster(&self, id: usize, members: &[usize], located: &[LocatedReport<'_>]) -> Cluster {
        let reports: Vec<&LocatedReport<'_>> = members.iter().map(|&i| &located[i]).collect();

        let centroid = centroid(&reports);

        #[allow(clippy::cast_precision_loss)]
        let severity = reports
            .iter()
            .map(|l| member_score(l.report, &self.weights))
            .sum::<f64>()
            / reports.len() as f64;

        let mut type_histogram = BTreeMap::new();
        for l in &reports {
            *type_histogram.entry(l.report.report_type).or_insert(0) += 1;
        }

        Cluster {
            id,
            members: reports.iter().map(|l| l.report.id.clone()).collect(),
            centroid,
            severity,
            type_histogram,
        }
    }
}

/// Score a single member contributes to its cluster's mean severity.
#[must_use]
pub fn member_score(report: &Report, weights: &SeverityWeights) -> f64 {
    let mut score = weights.base + weights.type_weight(report.report_type);
    if report.effective_severity() == ReportSeverity::High {
        score += weights.high_severity_bonus;
    }
    if report.status == ReportStatus::Resolved {
        score -= weights.resolved_penalty;
    }
    score
}

/// Arithmetic mean of member coordinates.
fn centroid(reports: &[&LocatedReport<'_>]) -> GeoPoint {
    let points: MultiPoint<f64> = reports
        .iter()
        .map(|l| Point::new(l.longitude, l.latitude))
        .collect::<Vec<_>>()
        .into();

    points.centroid().map_or(
        GeoPoint {
            latitude: f64::NAN,
            longitude: f64::NAN,
        },
        |c| GeoPoint {
            latitude: c.y(),
            longitude: c.x(),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone as _, Utc};
    use incident_map_report_models::{Location, ReportType};

    use super::*;

    fn report(id: &str, report_type: ReportType, lat: f64, lon: f64) -> Report {
        Report {
            id: id.to_string(),
            report_type,
            location: Location::real(lat, lon),
            status: ReportStatus::Pending,
            severity: None,
            description: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    fn engine(epsilon_km: f64, min_points: usize) -> ClusterEngine {
        ClusterEngine::new(
            DbscanParams {
                epsilon_km,
                min_points,
            },
            SeverityWeights::default(),
        )
    }

    fn assert_partition(reports: &[Report], result: &ClusteringResult) {
        let mut seen = BTreeSet::new();
        for id in result
            .clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .chain(result.noise.iter())
        {
            assert!(seen.insert(id.clone()), "{id} assigned twice");
        }
        let valid: BTreeSet<String> = reports
            .iter()
            .filter(|r| r.location.is_real)
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(seen, valid);
    }

    #[test]
    fn three_close_reports_cluster_and_far_one_is_noise() {
        let reports = vec![
            report("r1", ReportType::Police, 12.97, 77.59),
            report("r2", ReportType::Medical, 12.971, 77.591),
            report("r3", ReportType::Police, 12.972, 77.592),
            report("r4", ReportType::Infrastructure, 13.5, 78.1),
        ];
        let out = engine(5.0, 3).cluster(&reports);

        assert_eq!(out.result.clusters.len(), 1);
        let cluster = &out.result.clusters[0];
        assert_eq!(cluster.id, 1);
        assert_eq!(cluster.members, vec!["r1", "r2", "r3"]);
        assert_eq!(out.result.noise, vec!["r4"]);
        assert_eq!(cluster.type_histogram.get(&ReportType::Police), Some(&2));
        assert_eq!(cluster.type_histogram.get(&ReportType::Medical), Some(&1));
        assert!((cluster.centroid.latitude - 12.971).abs() < 1e-9);
        assert!((cluster.centroid.longitude - 77.591).abs() < 1e-9);
        assert_partition(&reports, &out.result);
    }

    #[test]
    fn dense_group_forms_exactly_one_cluster() {
        let reports: Vec<Report> = (0..6)
            .map(|i| {
                report(
                    &format!("r{i}"),
                    ReportType::Police,
                    40.0 + f64::from(i) * 0.001,
                    -74.0,
                )
            })
            .collect();
        let out = engine(1.0, 6).cluster(&reports);
        assert_eq!(out.result.clusters.len(), 1);
        assert_eq!(out.result.clusters[0].size(), 6);
        assert!(out.result.noise.is_empty());
    }

    #[test]
    fn lone_report_is_noise() {
        let reports = vec![report("solo", ReportType::Medical, 0.0, 0.0)];
        let out = engine(5.0, 1).cluster(&reports);
        assert_eq!(out.result.clusters.len(), 1, "minPoints=1 makes every point core");

        let out = engine(5.0, 2).cluster(&reports);
        assert!(out.result.clusters.is_empty());
        assert_eq!(out.result.noise, vec!["solo"]);
    }

    #[test]
    fn noise_point_becomes_border_of_later_cluster() {
        // "edge" comes first and has only one neighbour ("c1"), so it is
        // provisionally noise; the core group discovered later reaches it.
        let reports = vec![
            report("edge", ReportType::Police, 0.0, 0.0),
            report("c1", ReportType::Police, 0.0, 0.009),
            report("c2", ReportType::Police, 0.0, 0.012),
            report("c3", ReportType::Police, 0.0, 0.015),
        ];
        let out = engine(1.1, 3).cluster(&reports);
        assert_eq!(out.result.clusters.len(), 1);
        assert!(out.result.noise.is_empty());
        let members: BTreeSet<&str> = out.result.clusters[0]
            .members
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(members, BTreeSet::from(["edge", "c1", "c2", "c3"]));
        assert_eq!(out.result.clusters[0].members[0], "c1");
    }

    #[test]
    fn chain_of_cores_merges_into_one_cluster() {
        let reports: Vec<Report> = (0..10)
            .map(|i| report(&format!("p{i}"), ReportType::Police, 0.0, f64::from(i) * 0.03))
            .collect();
        // Consecutive points are ~3.3 km apart.
        let out = engine(3.5, 3).cluster(&reports);
        assert_eq!(out.result.clusters.len(), 1);
        assert_eq!(out.result.clusters[0].size(), 10);
    }

    #[test]
    fn separate_groups_are_numbered_in_discovery_order() {
        let mut reports = Vec::new();
        for i in 0..3 {
            reports.push(report(&format!("b{i}"), ReportType::Police, 10.0, 10.0 + f64::from(i) * 0.001));
        }
        for i in 0..3 {
            reports.push(report(&format!("a{i}"), ReportType::Police, 20.0, 20.0 + f64::from(i) * 0.001));
        }
        let out = engine(1.0, 3).cluster(&reports);
        assert_eq!(out.result.clusters.len(), 2);
        assert_eq!(out.result.clusters[0].members[0], "b0");
        assert_eq!(out.result.clusters[1].members[0], "a0");
        assert_eq!(out.result.clusters[1].id, 2);

        let again = engine(1.0, 3).cluster(&reports);
        assert_eq!(out.result, again.result);
    }

    #[test]
    fn invalid_and_simulated_locations_are_excluded() {
        let mut simulated = report("sim", ReportType::Police, 12.97, 77.59);
        simulated.location = Location::simulated(12.97, 77.59);
        let mut missing = report("missing", ReportType::Police, 0.0, 0.0);
        missing.location.latitude = None;
        let nan = report("nan", ReportType::Police, f64::NAN, 77.59);

        let reports = vec![
            report("r1", ReportType::Police, 12.97, 77.59),
            simulated,
            missing,
            nan,
        ];
        let out = engine(5.0, 3).cluster(&reports);

        assert_eq!(out.result.noise, vec!["r1"]);
        assert_eq!(out.dropped.len(), 3);
        assert_eq!(out.result.assigned_count(), 1);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let out = engine(5.0, 3).cluster(&[]);
        assert!(out.result.clusters.is_empty());
        assert!(out.result.noise.is_empty());
    }

    #[test]
    fn partition_holds_for_scattered_input() {
        let reports: Vec<Report> = (0..60)
            .map(|i| {
                let f = f64::from(i);
                report(
                    &format!("s{i}"),
                    ReportType::Police,
                    12.9 + (f * 0.37).sin() * 0.2,
                    77.5 + (f * 0.73).cos() * 0.2,
                )
            })
            .collect();
        for (eps, min) in [(0.5, 2), (2.0, 3), (5.0, 4), (50.0, 10)] {
            let out = engine(eps, min).cluster(&reports);
            assert_partition(&reports, &out.result);
        }
    }

    #[test]
    fn severity_uses_weight_table() {
        let mut high = report("m", ReportType::Medical, 1.0, 1.0);
        high.severity = Some(ReportSeverity::High);
        let mut resolved = report("p", ReportType::Police, 1.0, 1.0);
        resolved.status = ReportStatus::Resolved;
        let infra = report("i", ReportType::Infrastructure, 1.0, 1.0);

        let out = engine(1.0, 3).cluster(&[high, resolved, infra]);
        // (1+2+2) + (1+1.5-0.5) + (1+0.5) = 8.5 over 3 members
        assert!((out.result.clusters[0].severity - 8.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn resolved_member_never_raises_severity() {
        for report_type in ReportType::all() {
            let base = vec![
                report("a", ReportType::Medical, 1.0, 1.0),
                report("b", ReportType::Police, 1.0, 1.0),
                report("c", *report_type, 1.0, 1.0),
            ];
            let mut with_resolved = base.clone();
            with_resolved[2].status = ReportStatus::Resolved;

            let pending = engine(1.0, 3).cluster(&base).result.clusters[0].severity;
            let resolved = engine(1.0, 3).cluster(&with_resolved).result.clusters[0].severity;
            assert!(resolved < pending);
            assert!((pending - resolved - 0.5 / 3.0).abs() < 1e-12);
        }
    }
}
