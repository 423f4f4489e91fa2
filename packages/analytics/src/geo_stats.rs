//! Where the reports are: positional summary and ranked hotspots.

use incident_map_analytics_models::{
    BoundingBox, ClusteringResult, GeoPoint, GeoStatistics, Hotspot, HotspotSize, Spread,
};
use incident_map_spatial::LocatedReport;

/// Rough kilometres per degree used for the spread radius.
const APPROX_KM_PER_DEGREE: f64 = 111.0;

/// Mean centre, per-axis population standard deviation, approximate
/// radius and bounding box of the located reports, or `None` if there are
/// none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn geo_statistics(located: &[LocatedReport<'_>]) -> Option<GeoStatistics> {
    if located.is_empty() {
        return None;
    }

    let n = located.len() as f64;
    let center_lat = located.iter().map(|l| l.latitude).sum::<f64>() / n;
    let center_lon = located.iter().map(|l| l.longitude).sum::<f64>() / n;

    let lat_spread = std_dev(located.iter().map(|l| l.latitude), center_lat, n);
    let lon_spread = std_dev(located.iter().map(|l| l.longitude), center_lon, n);

    let radius_km = (lat_spread * APPROX_KM_PER_DEGREE).hypot(lon_spread * APPROX_KM_PER_DEGREE);

    let mut bounding_box = BoundingBox {
        north: f64::NEG_INFINITY,
        south: f64::INFINITY,
        east: f64::NEG_INFINITY,
        west: f64::INFINITY,
    };
    for l in located {
        bounding_box.north = bounding_box.north.max(l.latitude);
        bounding_box.south = bounding_box.south.min(l.latitude);
        bounding_box.east = bounding_box.east.max(l.longitude);
        bounding_box.west = bounding_box.west.min(l.longitude);
    }

    Some(GeoStatistics {
        center: GeoPoint {
            latitude: center_lat,
            longitude: center_lon,
        },
        spread: Spread {
            latitude: lat_spread,
            longitude: lon_spread,
        },
        radius_km,
        bounding_box,
    })
}

fn std_dev(values: impl Iterator<Item = f64>, mean: f64, n: f64) -> f64 {
    (values.map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Size label for a hotspot with `count` reports.
#[must_use]
pub const fn hotspot_size(count: usize) -> HotspotSize {
    if count > 10 {
        HotspotSize::High
    } else if count > 5 {
        HotspotSize::Medium
    } else {
        HotspotSize::Low
    }
}

/// One hotspot per cluster, largest first. Clusters of equal size keep
/// discovery order.
#[must_use]
pub fn hotspots(clustering: &ClusteringResult) -> Vec<Hotspot> {
    let mut hotspots: Vec<Hotspot> = clustering
        .clusters
        .iter()
        .map(|c| Hotspot {
            id: c.id,
            center: c.centroid,
            report_count: c.size() as u64,
            types: c.type_histogram.clone(),
            severity_score: c.severity,
            size: hotspot_size(c.size()),
        })
        .collect();

    hotspots.sort_by(|a, b| b.report_count.cmp(&a.report_count));
    hotspots
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone as _, Utc};
    use incident_map_analytics_models::Cluster;
    use incident_map_report_models::{Location, Report, ReportStatus, ReportType};
    use incident_map_spatial::partition_located;

    use super::*;

    fn report(id: &str, lat: f64, lon: f64) -> Report {
        Report {
            id: id.to_string(),
            report_type: ReportType::Medical,
            location: Location::real(lat, lon),
            status: ReportStatus::Pending,
            severity: None,
            description: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn cluster(id: usize, size: usize) -> Cluster {
        Cluster {
            id,
            members: (0..size).map(|i| format!("c{id}-{i}")).collect(),
            centroid: GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            severity: 3.0,
            type_histogram: BTreeMap::from([(ReportType::Police, size as u64)]),
        }
    }

    #[test]
    fn statistics_of_a_square() {
        let reports = vec![
            report("a", 10.0, 20.0),
            report("b", 12.0, 20.0),
            report("c", 10.0, 22.0),
            report("d", 12.0, 22.0),
        ];
        let (located, _) = partition_located(&reports);
        let stats = geo_statistics(&located).unwrap();

        assert!((stats.center.latitude - 11.0).abs() < 1e-12);
        assert!((stats.center.longitude - 21.0).abs() < 1e-12);
        assert!((stats.spread.latitude - 1.0).abs() < 1e-12);
        assert!((stats.spread.longitude - 1.0).abs() < 1e-12);
        assert!((stats.radius_km - 111.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!((stats.bounding_box.north - 12.0).abs() < f64::EPSILON);
        assert!((stats.bounding_box.south - 10.0).abs() < f64::EPSILON);
        assert!((stats.bounding_box.east - 22.0).abs() < f64::EPSILON);
        assert!((stats.bounding_box.west - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_located_reports_means_no_statistics() {
        assert!(geo_statistics(&[]).is_none());
    }

    #[test]
    fn hotspots_rank_by_size_and_label() {
        let clustering = ClusteringResult {
            clusters: vec![cluster(1, 4), cluster(2, 11), cluster(3, 6), cluster(4, 6)],
            noise: vec![],
        };
        let ranked = hotspots(&clustering);

        let ids: Vec<usize> = ranked.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
        assert_eq!(ranked[0].size, HotspotSize::High);
        assert_eq!(ranked[1].size, HotspotSize::Medium);
        assert_eq!(ranked[3].size, HotspotSize::Low);
        assert_eq!(ranked[0].types.get(&ReportType::Police), Some(&11));
    }

    #[test]
    fn size_label_boundaries() {
        assert_eq!(hotspot_size(5), HotspotSize::Low);
        assert_eq!(hotspot_size(6), HotspotSize::Medium);
        assert_eq!(hotspot_size(10), HotspotSize::Medium);
        assert_eq!(hotspot_size(11), HotspotSize::High);
    }
}
