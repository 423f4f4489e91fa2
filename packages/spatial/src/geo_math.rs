//! Great-circle distance on a spherical Earth.

/// Mean Earth radius used by every distance in the system, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Length of one degree of arc on [`EARTH_RADIUS_KM`], in kilometres.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Converts degrees to radians.
#[must_use]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

/// Converts radians to degrees.
#[must_use]
pub fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / std::f64::consts::PI)
}

/// Haversine distance between two points in kilometres.
///
/// Symmetric, zero for identical points, and NaN-propagating: callers
/// filter invalid coordinates before calling.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = to_radians(lat2 - lat1);
    let d_lon = to_radians(lon2 - lon1);

    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();

    let a = half_lat.mul_add(
        half_lat,
        to_radians(lat1).cos() * to_radians(lat2).cos() * half_lon * half_lon,
    );
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
