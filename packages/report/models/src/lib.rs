#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Citizen incident report types.
//!
//! A [`Report`] is a single geotagged submission from the citizen-facing
//! capture flow. The clustering and analysis core only ever reads these;
//! status transitions are administrative actions performed by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of incident a citizen reported.
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
pub enum ReportType {
    /// Crime or public-safety incident
    Police,
    /// Medical emergency
    Medical,
    /// Damaged roads, lighting, utilities, etc.
    Infrastructure,
}

impl ReportType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Police, Self::Medical, Self::Infrastructure]
    }

    /// Prefix used when minting report ids (e.g. `MED-1700000000000-42`).
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Police => "POL",
            Self::Medical => "MED",
            Self::Infrastructure => "INF",
        }
    }
}

/// Administrative handling status of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportStatus {
    /// Awaiting triage
    #[default]
    Pending,
    /// Being handled by responders
    InProgress,
    /// Closed out
    Resolved,
}

impl ReportStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::InProgress, Self::Resolved]
    }
}

/// Citizen-assessed severity of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ReportSeverity {
    /// Minor, no urgency
    Low,
    /// Default when the reporter did not choose
    #[default]
    Medium,
    /// Urgent
    High,
}

/// Where a report was captured.
///
/// `is_real == false` marks a simulated or fallback position (e.g. the
/// device refused geolocation). Such reports never take part in
/// clustering or facility search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in degrees (WGS84).
    pub latitude: Option<f64>,
    /// Longitude in degrees (WGS84).
    pub longitude: Option<f64>,
    /// Whether the position came from a real device fix.
    #[serde(default)]
    pub is_real: bool,
}

impl Location {
    /// A real device fix at the given coordinates.
    #[must_use]
    pub const fn real(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            is_real: true,
        }
    }

    /// A simulated/fallback position.
    #[must_use]
    pub const fn simulated(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            is_real: false,
        }
    }

    /// Both coordinates, if present. Does not check finiteness or
    /// [`Self::is_real`].
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A single citizen submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Globally unique, immutable id (e.g. `POL-1700000000000-512`).
    pub id: String,
    /// Incident kind.
    #[serde(rename = "type")]
    pub report_type: ReportType,
    /// Capture location.
    pub location: Location,
    /// Handling status.
    #[serde(default)]
    pub status: ReportStatus,
    /// Reporter-assessed severity, mostly on medical/infrastructure reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ReportSeverity>,
    /// Free-text description, if the reporter added one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time, set once by the capture flow.
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Severity used for scoring: absent severity counts as medium.
    #[must_use]
    pub fn effective_severity(&self) -> ReportSeverity {
        self.severity.unwrap_or_default()
    }

    /// Mints a report id in the `<PREFIX>-<millis>-<suffix>` form used by
    /// the capture flow.
    #[must_use]
    pub fn mint_id(report_type: ReportType, created_at: DateTime<Utc>, suffix: u16) -> String {
        format!(
            "{}-{}-{}",
            report_type.id_prefix(),
            created_at.timestamp_millis(),
            suffix % 1000
        )
    }
}
