//! `OpenStreetMap` Overpass API facility provider.
//!
//! Queries nodes, ways and relations tagged with the configured `amenity`
//! around a point and maps them to [`Facility`] records. Ways and
//! relations are located by the `center` Overpass computes for them.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API>

use std::time::Duration;

use async_trait::async_trait;
use incident_map_facility_models::Facility;
use serde_json::Value;

use crate::service_registry::FacilityService;
use crate::{FacilityError, FacilityProvider, retry};

/// Name used when an element carries no name tag at all.
const UNNAMED: &str = "Unnamed Hospital";

/// Overpass-backed [`FacilityProvider`].
#[derive(Debug, Clone)]
pub struct OverpassProvider {
    client: reqwest::Client,
    base_url: String,
    amenity: String,
    timeout_secs: u64,
}

impl OverpassProvider {
    /// Creates a provider for `amenity` against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        amenity: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, FacilityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.saturating_add(5)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            amenity: amenity.into(),
            timeout_secs,
        })
    }

    /// Creates a provider from a registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError::Http`] if the HTTP client cannot be built.
    pub fn from_service(service: &FacilityService) -> Result<Self, FacilityError> {
        Self::new(&service.base_url, &service.amenity, service.timeout_secs)
    }
}

#[async_trait]
impl FacilityProvider for OverpassProvider {
    fn name(&self) -> &'static str {
        "overpass"
    }

    async fn search(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<Facility>, FacilityError> {
        let query = build_query(&self.amenity, latitude, longitude, radius_km, self.timeout_secs);
        log::debug!(
            "Querying Overpass for {} within {radius_km} km of ({latitude}, {longitude})",
            self.amenity
        );

        let body = retry::send_json(|| {
            self.client
                .post(&self.base_url)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(query.clone())
        })
        .await?;

        let facilities = parse_response(&body)?;
        log::debug!("Overpass returned {} facilities", facilities.len());
        Ok(facilities)
    }
}

/// Overpass QL for every element tagged `amenity=<amenity>` within
/// `radius_km` of the point, with centres for non-node elements.
#[must_use]
pub fn build_query(
    amenity: &str,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    timeout_secs: u64,
) -> String {
    let radius_m = radius_km * 1000.0;
    let around = format!("(around:{radius_m},{latitude},{longitude})");
    format!(
        "[out:json][timeout:{timeout_secs}];\n\
         (\n  \
         node[\"amenity\"=\"{amenity}\"]{around};\n  \
         way[\"amenity\"=\"{amenity}\"]{around};\n  \
         relation[\"amenity\"=\"{amenity}\"]{around};\n\
         );\n\
         out center;\n"
    )
}

/// Parses an Overpass JSON response. Elements without coordinates are
/// skipped; a response with no `elements` is an empty result.
///
/// # Errors
///
/// Returns [`FacilityError::Parse`] if the body is not a JSON object.
pub fn parse_response(body: &Value) -> Result<Vec<Facility>, FacilityError> {
    if !body.is_object() {
        return Err(FacilityError::Parse {
            message: "Overpass response is not an object".to_string(),
        });
    }

    let Some(elements) = body["elements"].as_array() else {
        return Ok(vec![]);
    };

    Ok(elements.iter().filter_map(parse_element).collect())
}

fn parse_element(element: &Value) -> Option<Facility> {
    let osm_type = element["type"].as_str()?;
    let osm_id = element["id"].as_u64()?;

    let (latitude, longitude) = if osm_type == "node" {
        (element["lat"].as_f64()?, element["lon"].as_f64()?)
    } else if let (Some(lat), Some(lon)) = (
        element["center"]["lat"].as_f64(),
        element["center"]["lon"].as_f64(),
    ) {
        (lat, lon)
    } else {
        (element["lat"].as_f64()?, element["lon"].as_f64()?)
    };

    let tags = &element["tags"];
    let tag = |key: &str| tag_value(tags, key);
    let first_tag = |keys: &[&str]| keys.iter().find_map(|&k| tag_value(tags, k)).map(String::from);

    let name =
        first_tag(&["name", "name:en", "official_name"]).unwrap_or_else(|| UNNAMED.to_string());

    let address = first_tag(&["addr:full"]).or_else(|| {
        let parts: Vec<&str> = [
            "addr:housenumber",
            "addr:street",
            "addr:city",
            "addr:state",
            "addr:postcode",
        ]
        .iter()
        .filter_map(|&k| tag_value(tags, k))
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    });

    Some(Facility {
        id: format!("OSM_{osm_type}_{osm_id}"),
        name,
        latitude,
        longitude,
        address,
        phone: first_tag(&["phone", "contact:phone", "phone:mobile"]),
        email: first_tag(&["email", "contact:email"]),
        website: first_tag(&["website", "contact:website"]),
        kind: first_tag(&["healthcare", "healthcare:speciality"]),
        emergency: tag("emergency") == Some("yes") || tag("emergency:room") == Some("yes"),
        beds: tag("beds").and_then(|b| b.parse().ok()),
        operator: first_tag(&["operator"]),
        source: Some("OpenStreetMap".to_string()),
    })
}

/// A non-empty, trimmed tag value.
fn tag_value<'a>(tags: &'a Value, key: &str) -> Option<&'a str> {
    tags.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
