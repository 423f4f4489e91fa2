#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis result types and tunable parameter tables.
//!
//! Everything here is derived and ephemeral: clusters, risk scores and
//! temporal profiles are recomputed on every analysis run and are never
//! authoritative state. Field names follow the camelCase JSON contract
//! the dashboard and export layer consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use incident_map_facility_models::FacilityMatch;
use incident_map_report_models::{ReportStatus, ReportType};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

// ── Parameter tables ────────────────────────────────────────────────

/// DBSCAN parameters.
///
/// `epsilon_km` is always kilometres, matching the Haversine distance the
/// neighbourhood query uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbscanParams {
    /// Neighbourhood radius in kilometres.
    pub epsilon_km: f64,
    /// Minimum neighbourhood size (including the point itself) for a core
    /// point.
    pub min_points: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            epsilon_km: 5.0,
            min_points: 3,
        }
    }
}

/// Per-member contributions to a cluster's severity score.
///
/// A member scores `base + type weight`, plus `high_severity_bonus` when
/// its severity is high, minus `resolved_penalty` when it is resolved.
/// The cluster severity is the mean member score.
/// The defaults are the published weight table and must not drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    /// Score every member starts from.
    pub base: f64,
    /// Added for medical reports.
    pub medical: f64,
    /// Added for police reports.
    pub police: f64,
    /// Added for infrastructure reports.
    pub infrastructure: f64,
    /// Added when the member's severity is high.
    pub high_severity_bonus: f64,
    /// Subtracted when the member is resolved.
    pub resolved_penalty: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            medical: 2.0,
            police: 1.5,
            infrastructure: 0.5,
            high_severity_bonus: 2.0,
            resolved_penalty: 0.5,
        }
    }
}

impl SeverityWeights {
    /// Weight added for a report type.
    #[must_use]
    pub const fn type_weight(&self, report_type: ReportType) -> f64 {
        match report_type {
            ReportType::Medical => self.medical,
            ReportType::Police => self.police,
            ReportType::Infrastructure => self.infrastructure,
        }
    }
}

/// Coefficients and thresholds of the 0-100 risk index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    /// Points contributed by a fully pending report set.
    pub pending: f64,
    /// Points contributed when one cluster holds every report.
    pub density: f64,
    /// Points contributed by report volume once saturated.
    pub volume: f64,
    /// Report count at which the volume term saturates.
    pub volume_saturation: f64,
    /// Lowest index classified as medium.
    pub medium_from: u8,
    /// Index above which risk is high.
    pub high_above: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            pending: 40.0,
            density: 40.0,
            volume: 20.0,
            volume_saturation: 10.0,
            medium_from: 40,
            high_above: 70,
        }
    }
}

// ── Clustering ──────────────────────────────────────────────────────

/// A density-connected group of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// 1-based id in order of seed discovery.
    pub id: usize,
    /// Member report ids in the order they were absorbed; no duplicates.
    pub members: Vec<String>,
    /// Mean latitude/longitude of the members.
    pub centroid: GeoPoint,
    /// Mean member score under [`SeverityWeights`].
    pub severity: f64,
    /// Member count per report type.
    pub type_histogram: BTreeMap<ReportType, u64>,
}

impl Cluster {
    /// Number of member reports.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Output of one clustering pass.
///
/// `clusters` and `noise` partition the valid-location input: every
/// valid report id appears exactly once across the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    /// Clusters in discovery order.
    pub clusters: Vec<Cluster>,
    /// Ids of reports not density-reachable from any core point.
    pub noise: Vec<String>,
}

impl ClusteringResult {
    /// Size of the largest cluster, or 0 if there are none.
    #[must_use]
    pub fn largest_cluster_size(&self) -> usize {
        self.clusters.iter().map(Cluster::size).max().unwrap_or(0)
    }

    /// Total number of reports placed in clusters or noise.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum::<usize>() + self.noise.len()
    }
}

// ── Risk ────────────────────────────────────────────────────────────

/// Risk bucket for the 0-100 risk index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    /// Index below the medium threshold
    Low,
    /// Index between the thresholds (inclusive)
    Medium,
    /// Index above the high threshold
    High,
    /// No reports to score
    Unknown,
}

/// Overall risk index plus the counts it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Risk index, 0-100.
    pub overall: u8,
    /// Bucketed level.
    pub risk_level: RiskLevel,
    /// Report count per type.
    pub by_type: BTreeMap<ReportType, u64>,
    /// Report count per status.
    pub by_status: BTreeMap<ReportStatus, u64>,
}

impl RiskAssessment {
    /// The assessment for an empty report set.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            overall: 0,
            risk_level: RiskLevel::Unknown,
            by_type: BTreeMap::new(),
            by_status: BTreeMap::new(),
        }
    }
}

// ── Temporal ────────────────────────────────────────────────────────

/// Raw bucket counts behind a [`TemporalProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalDistributions {
    /// 24 counters, index = hour of day.
    pub hourly: Vec<u64>,
    /// 7 counters, index 0 = Sunday.
    pub weekly: Vec<u64>,
    /// 12 counters, index 0 = January.
    pub monthly: Vec<u64>,
}

/// Peak-activity windows of a report set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalProfile {
    /// Busiest hour of day (0-23).
    pub peak_hour: u8,
    /// Busiest weekday (0 = Sunday).
    pub peak_weekday: u8,
    /// Name of the busiest weekday (e.g. "Monday").
    pub peak_weekday_name: String,
    /// Busiest month (0 = January).
    pub peak_month: u8,
    /// Abbreviated name of the busiest month (e.g. "Mar").
    pub peak_month_name: String,
    /// The counters the peaks were taken from.
    pub distributions: TemporalDistributions,
}

// ── Geography ───────────────────────────────────────────────────────

/// Size label of a hotspot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HotspotSize {
    /// 5 or fewer reports
    Low,
    /// 6 to 10 reports
    Medium,
    /// More than 10 reports
    High,
}

/// A cluster viewed as a prioritised area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Id of the underlying cluster.
    pub id: usize,
    /// Cluster centroid.
    pub center: GeoPoint,
    /// Number of reports in the hotspot.
    pub report_count: u64,
    /// Report count per type.
    pub types: BTreeMap<ReportType, u64>,
    /// Mean severity score of the underlying cluster.
    pub severity_score: f64,
    /// Size label.
    pub size: HotspotSize,
}

/// Spread in degrees along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spread {
    /// Latitude standard deviation.
    pub latitude: f64,
    /// Longitude standard deviation.
    pub longitude: f64,
}

/// Axis-aligned bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Maximum latitude.
    pub north: f64,
    /// Minimum latitude.
    pub south: f64,
    /// Maximum longitude.
    pub east: f64,
    /// Minimum longitude.
    pub west: f64,
}

/// Summary of where the analysed reports are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoStatistics {
    /// Mean position.
    pub center: GeoPoint,
    /// Per-axis standard deviation.
    pub spread: Spread,
    /// Approximate spread radius in kilometres.
    pub radius_km: f64,
    /// Extent of all positions.
    pub bounding_box: BoundingBox,
}

// ── Composite result ────────────────────────────────────────────────

/// Where the insight text came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InsightSource {
    /// Returned by the external text-insight generator.
    Generated,
    /// Synthesised locally from the analysis figures.
    Fallback,
}

/// Nearest facility resolved for one medical report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalAssignment {
    /// The medical report.
    pub report_id: String,
    /// Nearest facility, absent when the lookup failed or found nothing.
    pub nearest: Option<FacilityMatch>,
}

/// Run metadata attached to every [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Reports considered (after date-range filtering).
    pub report_count: u64,
    /// Reports with a usable real location.
    pub located_count: u64,
    /// Date-range filter in days, if one was applied.
    pub date_range_days: Option<u32>,
    /// Insight generator name, if one was configured.
    pub provider: Option<String>,
}

/// The composite output of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Clusters and noise.
    pub clustering: ClusteringResult,
    /// Risk index, 0-100.
    pub risk_index: u8,
    /// Full risk breakdown.
    pub risk: RiskAssessment,
    /// Peak-activity windows.
    pub temporal_profile: TemporalProfile,
    /// Clusters ranked by size.
    pub hotspots: Vec<Hotspot>,
    /// Positional summary, absent when no report has a usable location.
    pub geo_statistics: Option<GeoStatistics>,
    /// Short narrative about where incidents concentrate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_analysis: Option<String>,
    /// Short narrative about the clustering and risk figures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_insights: Option<String>,
    /// Narrative summary.
    pub insight_text: Option<String>,
    /// Whether `insight_text` was generated or synthesised.
    pub insight_source: InsightSource,
    /// Nearest facilities for medical reports, when resolution is enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medical_assignments: Vec<MedicalAssignment>,
    /// Run metadata.
    pub metadata: AnalysisMetadata,
    /// When the result was assembled.
    pub generated_at: DateTime<Utc>,
}

/// Per-call analysis options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Only analyse reports created within this many days.
    pub date_range_days: Option<u32>,
    /// "Now" for date-range filtering; defaults to the current time.
    pub reference_time: Option<DateTime<Utc>>,
}
