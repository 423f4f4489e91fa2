#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearest emergency facility resolution.
//!
//! The pure part ([`graph`]) ranks a supplied list of facilities against a
//! query point. The I/O part wraps a [`FacilityProvider`] (by default the
//! `OpenStreetMap` Overpass API, configured from `services/`) with a TTL
//! cache and a timeout in [`finder::FacilityFinder`].

pub mod cache;
pub mod finder;
pub mod graph;
pub mod overpass;
pub mod retry;
pub mod service_registry;

use async_trait::async_trait;
use incident_map_facility_models::{Facility, QueryPoint};

pub use finder::FacilityFinder;
pub use graph::{
    FacilityGraph, estimated_travel_minutes, find_nearest_facility, find_nearest_facility_with,
    find_top_k_facilities, nearest_via_mst,
};

/// Errors from facility lookups.
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider response could not be understood.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider did not answer in time.
    #[error("Facility lookup timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// The provider rejected the request or is down.
    #[error("Facility provider unavailable: {message}")]
    Unavailable {
        /// What the provider reported.
        message: String,
    },

    /// The search succeeded but found nothing.
    #[error("No facilities found within {radius_km} km, try a larger search radius")]
    NoFacilitiesFound {
        /// Radius that was searched.
        radius_km: f64,
    },

    /// The query point is not a usable coordinate.
    #[error("Invalid query location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Requested latitude.
        latitude: f64,
        /// Requested longitude.
        longitude: f64,
    },
}

/// A live nearby-facility lookup.
///
/// Implementations return an empty list, not an error, when nothing is
/// within the radius.
#[async_trait]
pub trait FacilityProvider: Send + Sync {
    /// Short provider name for logs (e.g. `"overpass"`).
    fn name(&self) -> &str;

    /// Facilities within `radius_km` of the given point.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError`] if the provider cannot be reached or its
    /// response cannot be parsed.
    async fn search(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<Facility>, FacilityError>;
}

/// Google Maps driving directions from `origin` to `facility`.
#[must_use]
pub fn directions_url(facility: &Facility, origin: QueryPoint) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={},{}&destination={},{}&travelmode=driving",
        origin.latitude, origin.longitude, facility.latitude, facility.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_url_contains_both_endpoints() {
        let facility = Facility::new("OSM_node_1", "General", 12.98, 77.6);
        let url = directions_url(&facility, QueryPoint::new(12.97, 77.59));
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&origin=12.97,77.59&destination=12.98,77.6&travelmode=driving"
        );
    }

    #[test]
    fn no_facilities_message_hints_at_radius() {
        let e = FacilityError::NoFacilitiesFound { radius_km: 10.0 };
        assert_eq!(
            e.to_string(),
            "No facilities found within 10 km, try a larger search radius"
        );
    }
}
