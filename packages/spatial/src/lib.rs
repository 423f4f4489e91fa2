#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry and density clustering for incident reports.
//!
//! Provides the Haversine distance every other crate measures with, an
//! R-tree backed neighbourhood index, and the DBSCAN engine that groups
//! reports into clusters. Reports without a real, finite location are
//! filtered here once so downstream code can assume clean coordinates.

pub mod dbscan;
pub mod geo_math;
pub mod index;

use std::collections::BTreeSet;

use incident_map_report_models::Report;

pub use dbscan::{ClusterEngine, ClusterOutput, member_score};
pub use geo_math::{EARTH_RADIUS_KM, KM_PER_DEGREE, distance_km};
pub use index::PointIndex;

/// Why a report was excluded from geometric processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    /// Latitude or longitude absent.
    #[error("Report {id} has no coordinates")]
    MissingCoordinates {
        /// Report id.
        id: String,
    },
    /// Latitude or longitude is NaN or infinite.
    #[error("Report {id} has non-finite coordinates")]
    NonFiniteCoordinates {
        /// Report id.
        id: String,
    },
    /// Position is a simulated fallback rather than a device fix.
    #[error("Report {id} has a simulated location")]
    SimulatedLocation {
        /// Report id.
        id: String,
    },
    /// Id already seen earlier in the same input.
    #[error("Duplicate report id {id}")]
    DuplicateId {
        /// Report id.
        id: String,
    },
}

/// A report excluded before clustering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedReport {
    /// Id of the excluded report.
    pub id: String,
    /// Why it was excluded.
    pub reason: InvalidInputError,
}

/// A report with validated, finite coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LocatedReport<'a> {
    /// The underlying report.
    pub report: &'a Report,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Splits `reports` into those usable for geometry and those dropped.
///
/// A report is usable when its location is real and both coordinates are
/// present and finite. Only the first report with a given id is kept.
/// Input order is preserved.
#[must_use]
pub fn partition_located(reports: &[Report]) -> (Vec<LocatedReport<'_>>, Vec<DroppedReport>) {
    let mut located = Vec::with_capacity(reports.len());
    let mut dropped = Vec::new();
    let mut seen = BTreeSet::new();

    for report in reports {
        match locate(report) {
            Ok(l) => {
                if seen.insert(report.id.as_str()) {
                    located.push(l);
                } else {
                    log::warn!("Dropping report {}: duplicate id", report.id);
                    dropped.push(DroppedReport {
                        id: report.id.clone(),
                        reason: InvalidInputError::DuplicateId {
                            id: report.id.clone(),
                        },
                    });
                }
            }
            Err(reason) => {
                if matches!(reason, InvalidInputError::SimulatedLocation { .. }) {
                    log::debug!("Skipping report {}: {reason}", report.id);
                } else {
                    log::warn!("Dropping report {}: {reason}", report.id);
                }
                dropped.push(DroppedReport {
                    id: report.id.clone(),
                    reason,
                });
            }
        }
    }

    (located, dropped)
}

/// Validates a single report's location.
///
/// # Errors
///
/// * If the location is simulated
/// * If a coordinate is missing
/// * If a coordinate is NaN or infinite
pub fn locate(report: &Report) -> Result<LocatedReport<'_>, InvalidInputError> {
    if !report.location.is_real {
        return Err(InvalidInputError::SimulatedLocation {
            id: report.id.clone(),
        });
    }

    let (latitude, longitude) =
        report
            .location
            .coordinates()
            .ok_or_else(|| InvalidInputError::MissingCoordinates {
                id: report.id.clone(),
            })?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(InvalidInputError::NonFiniteCoordinates {
            id: report.id.clone(),
        });
    }

    Ok(LocatedReport {
        report,
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use incident_map_report_models::{Location, ReportStatus, ReportType};

    use super::*;

    fn report(id: &str, location: Location) -> Report {
        Report {
            id: id.to_string(),
            report_type: ReportType::Police,
            location,
            status: ReportStatus::Pending,
            severity: None,
            description: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn partition_keeps_order_and_reports_reasons() {
        let reports = vec![
            report("a", Location::real(1.0, 2.0)),
            report("b", Location::simulated(1.0, 2.0)),
            report("c", Location::real(f64::INFINITY, 2.0)),
            report(
                "d",
                Location {
                    latitude: Some(1.0),
                    longitude: None,
                    is_real: true,
                },
            ),
            report("e", Location::real(3.0, 4.0)),
            report("a", Location::real(5.0, 6.0)),
        ];

        let (located, dropped) = partition_located(&reports);
        let ids: Vec<&str> = located.iter().map(|l| l.report.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        assert!((located[0].latitude - 1.0).abs() < f64::EPSILON);

        let reasons: Vec<&InvalidInputError> = dropped.iter().map(|d| &d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &InvalidInputError::SimulatedLocation { id: "b".into() },
                &InvalidInputError::NonFiniteCoordinates { id: "c".into() },
                &InvalidInputError::MissingCoordinates { id: "d".into() },
                &InvalidInputError::DuplicateId { id: "a".into() },
            ]
        );
    }
}
