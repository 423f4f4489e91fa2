#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Emergency facility types.
//!
//! Facilities (hospitals, clinics) are supplied per query by an external
//! point-of-interest provider and are read-only to the core.

use chrono::{DateTime, Utc};
use incident_map_report_models::ReportSeverity;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A facility returned by a point-of-interest lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Provider-scoped identifier (e.g. `OSM_node_123456`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    /// Postal address, when the provider knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Website URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Facility kind as tagged by the provider (e.g. "hospital", "clinic").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the facility runs an emergency department.
    #[serde(default)]
    pub emergency: bool,
    /// Bed count, if tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    /// Operating organisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Which provider produced this record (e.g. "OpenStreetMap").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Facility {
    /// A facility with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            address: None,
            phone: None,
            email: None,
            website: None,
            kind: None,
            emergency: false,
            beds: None,
            operator: None,
            source: None,
        }
    }
}

/// A point a facility search is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl QueryPoint {
    /// Creates a query point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A facility paired with its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityMatch {
    /// The matched facility.
    pub facility: Facility,
    /// Great-circle distance from the query point in kilometres.
    pub distance_km: f64,
    /// Estimated driving time in whole minutes (rounded up).
    pub estimated_time_min: u32,
}

/// Which algorithm picks the single nearest facility.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NearestStrategy {
    /// Sort all candidates by distance and take the first.
    #[default]
    Sorted,
    /// Legacy mode: Prim's MST rooted at the query point, with a linear
    /// scan fallback.
    Mst,
}

/// The full outcome of a nearby-facility search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySearchResult {
    /// The single nearest facility.
    pub nearest: FacilityMatch,
    /// Closest candidates in ascending distance order (includes `nearest`).
    pub alternatives: Vec<FacilityMatch>,
    /// Where the search was anchored.
    pub query_point: QueryPoint,
    /// Severity of the emergency that triggered the search, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ReportSeverity>,
    /// When the search completed.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_match_serializes_camel_case() {
        let m = FacilityMatch {
            facility: Facility::new("OSM_node_1", "General", 12.9, 77.6),
            distance_km: 2.0,
            estimated_time_min: 3,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["distanceKm"], 2.0);
        assert_eq!(json["estimatedTimeMin"], 3);
        assert_eq!(json["facility"]["name"], "General");
        assert!(json["facility"].get("phone").is_none());
    }

    #[test]
    fn strategy_parses_from_str() {
        assert_eq!("mst".parse::<NearestStrategy>().unwrap(), NearestStrategy::Mst);
        assert_eq!(
            "sorted".parse::<NearestStrategy>().unwrap(),
            NearestStrategy::Sorted
        );
        assert_eq!(NearestStrategy::default(), NearestStrategy::Sorted);
    }
}
