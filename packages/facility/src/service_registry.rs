//! Compile-time registry of facility lookup services.
//!
//! Each provider is described by a TOML file under `services/`, embedded
//! at compile time and exposed via [`all_services`] and
//! [`enabled_services`].

use serde::Deserialize;

/// A facility lookup service configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacilityService {
    /// Unique identifier (e.g. `"overpass"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API endpoint.
    pub base_url: String,
    /// OSM `amenity` tag value to search for.
    #[serde(default = "default_amenity")]
    pub amenity: String,
    /// Per-request timeout in seconds, also sent as the server-side
    /// query timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long search results stay cached, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

const fn default_true() -> bool {
    true
}

fn default_amenity() -> String {
    "hospital".to_string()
}

const fn default_timeout_secs() -> u64 {
    25
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("overpass", include_str!("../services/overpass.toml"))];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all facility service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<FacilityService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse facility service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, in declaration order.
#[must_use]
pub fn enabled_services() -> Vec<FacilityService> {
    all_services().into_iter().filter(|s| s.enabled).collect()
}

/// The first enabled service, which is the one used by default.
#[must_use]
pub fn default_service() -> Option<FacilityService> {
    enabled_services().into_iter().next()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for svc in &all_services() {
            assert!(seen.insert(svc.id.clone()), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn overpass_is_the_default_hospital_source() {
        let svc = default_service().unwrap();
        assert_eq!(svc.id, "overpass");
        assert_eq!(svc.amenity, "hospital");
        assert_eq!(svc.cache_ttl_secs, 300);
        assert!(svc.base_url.starts_with("https://"));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let svc: FacilityService = toml::de::from_str(
            r#"
            id = "local"
            name = "Local"
            base_url = "http://localhost:12345/api/interpreter"
            "#,
        )
        .unwrap();
        assert!(svc.enabled);
        assert_eq!(svc.amenity, "hospital");
        assert_eq!(svc.timeout_secs, 25);
        assert_eq!(svc.cache_ttl_secs, 300);
    }
}
