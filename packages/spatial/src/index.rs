//! R-tree point index for epsilon-neighbourhood queries.
//!
//! Candidates are pre-selected with a bounding box on the sphere and
//! then confirmed with the exact Haversine distance, so the result is
//! identical to a brute-force scan. Boxes that touch a pole or wrap the
//! antimeridian fall back to the brute-force scan.

use std::f64::consts::FRAC_PI_2;

use rstar::{AABB, RTree, RTreeObject};

use crate::geo_math::{EARTH_RADIUS_KM, distance_km, to_degrees, to_radians};

/// Widens the search box slightly so rounding never excludes a point
/// that the exact distance check would accept.
const BOX_MARGIN: f64 = 1.000_001;

/// Absolute slack in degrees added on every side of the search box.
const BOX_SLACK_DEG: f64 = 1e-9;

/// A located point stored in the R-tree with its position in the input.
struct IndexedPoint {
    index: usize,
    latitude: f64,
    longitude: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.longitude, self.latitude])
    }
}

/// Spatial index over a fixed slice of `(latitude, longitude)` points.
pub struct PointIndex {
    points: Vec<(f64, f64)>,
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Builds the index. Point `i` keeps index `i` in query results.
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(index, &(latitude, longitude))| IndexedPoint {
                index,
                latitude,
                longitude,
            })
            .collect();

        Self {
            points,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of every point within `radius_km` of point `index`
    /// (inclusive, and including `index` itself), in ascending order.
    #[must_use]
    pub fn neighbors(&self, index: usize, radius_km: f64) -> Vec<usize> {
        let (lat, lon) = self.points[index];
        self.within(lat, lon, radius_km)
    }

    /// Indices of every point within `radius_km` of `(lat, lon)`, in
    /// ascending order.
    #[must_use]
    pub fn within(&self, lat: f64, lon: f64, radius_km: f64) -> Vec<usize> {
        let in_range = |plat: f64, plon: f64| distance_km(lat, lon, plat, plon) <= radius_km;

        let mut found: Vec<usize> = match search_box(lat, lon, radius_km) {
            Some(envelope) => self
                .tree
                .locate_in_envelope(&envelope)
                .filter(|p| in_range(p.latitude, p.longitude))
                .map(|p| p.index)
                .collect(),
            None => self
                .points
                .iter()
                .enumerate()
                .filter(|(_, p)| in_range(p.0, p.1))
                .map(|(i, _)| i)
                .collect(),
        };

        found.sort_unstable();
        found
    }
}

/// Bounding box (lon/lat degrees) containing every point within
/// `radius_km` of `(lat, lon)`, or `None` when the box would reach a pole
/// or cross the antimeridian.
fn search_box(lat: f64, lon: f64, radius_km: f64) -> Option<AABB<[f64; 2]>> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return None;
    }

    let angular = radius_km / EARTH_RADIUS_KM * BOX_MARGIN;
    let lat_rad = to_radians(lat);
    if lat_rad - angular <= -FRAC_PI_2 || lat_rad + angular >= FRAC_PI_2 {
        return None;
    }

    let ratio = angular.sin() / lat_rad.cos();
    if !(0.0..1.0).contains(&ratio) {
        return None;
    }

    let delta_lat = to_degrees(angular) + BOX_SLACK_DEG;
    let delta_lon = to_degrees(ratio.asin()) + BOX_SLACK_DEG;
    if lon - delta_lon < -180.0 || lon + delta_lon > 180.0 {
        return None;
    }

    Some(AABB::from_corners(
        [lon - delta_lon, lat - delta_lat],
        [lon + delta_lon, lat + delta_lat],
    ))
}
