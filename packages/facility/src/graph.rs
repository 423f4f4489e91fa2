//! Distance graph between a query point and candidate facilities.
//!
//! Node 0 is always the query point; node `i + 1` is `facilities[i]`.
//! Two resolvers are offered: a plain sorted-distance top-K, and the
//! legacy Prim's-MST resolver that picks the cheapest facility hanging
//! directly off the query node, falling back to a linear scan when none
//! does.

use incident_map_facility_models::{Facility, FacilityMatch, NearestStrategy, QueryPoint};
use incident_map_spatial::distance_km;

/// Average urban driving speed used for travel time estimates.
pub const AVERAGE_URBAN_SPEED_KMH: f64 = 40.0;

/// Number of alternatives returned by a facility search unless overridden.
pub const DEFAULT_ALTERNATIVES: usize = 5;

/// Estimated travel time in whole minutes, rounded up.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimated_travel_minutes(distance_km: f64) -> u32 {
    (distance_km / AVERAGE_URBAN_SPEED_KMH * 60.0).ceil() as u32
}

fn to_match(facility: &Facility, distance_km: f64) -> FacilityMatch {
    FacilityMatch {
        facility: facility.clone(),
        distance_km,
        estimated_time_min: estimated_travel_minutes(distance_km),
    }
}

/// Complete undirected weighted graph over the query point and facilities.
#[derive(Debug, Clone)]
pub struct FacilityGraph {
    weights: Vec<Vec<f64>>,
}

/// Prim's algorithm output, indexed by node.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanningTree {
    /// MST parent of each node; `None` for the root and unreachable nodes.
    pub parent: Vec<Option<usize>>,
    /// Weight of the edge that attached each node (0 for the root).
    pub key: Vec<f64>,
}

impl FacilityGraph {
    /// Builds the graph with Haversine edge weights, including every
    /// facility-facility edge.
    #[must_use]
    pub fn build(query: QueryPoint, facilities: &[Facility]) -> Self {
        let coords: Vec<(f64, f64)> = std::iter::once((query.latitude, query.longitude))
            .chain(facilities.iter().map(|f| (f.latitude, f.longitude)))
            .collect();
        let n = coords.len();

        let mut weights = vec![vec![f64::INFINITY; n]; n];
        for i in 0..n {
            weights[i][i] = 0.0;
            for j in (i + 1)..n {
                let d = distance_km(coords[i].0, coords[i].1, coords[j].0, coords[j].1);
                weights[i][j] = d;
                weights[j][i] = d;
            }
        }

        Self { weights }
    }

    /// Number of nodes, including the query node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.weights.len()
    }

    /// Edge weight between two nodes.
    #[must_use]
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from][to]
    }

    /// Runs Prim's algorithm rooted at the query node.
    ///
    /// Edges with a non-finite or NaN weight are never taken, so nodes
    /// reachable only through them stay unattached.
    #[must_use]
    pub fn minimum_spanning_tree(&self) -> SpanningTree {
        let n = self.node_count();
        let mut visited = vec![false; n];
        let mut parent = vec![None; n];
        let mut key = vec![f64::INFINITY; n];

        if n == 0 {
            return SpanningTree { parent, key };
        }
        key[0] = 0.0;

        for _ in 0..n {
            let mut min_key = f64::INFINITY;
            let mut min_index = None;
            for v in 0..n {
                if !visited[v] && key[v] < min_key {
                    min_key = key[v];
                    min_index = Some(v);
                }
            }

            let Some(u) = min_index else {
                break;
            };
            visited[u] = true;

            for v in 0..n {
                let w = self.weights[u][v];
                if !visited[v] && w.is_finite() && w < key[v] {
                    parent[v] = Some(u);
                    key[v] = w;
                }
            }
        }

        SpanningTree { parent, key }
    }
}

/// Legacy resolver: the facility whose MST parent is the query node, with
/// the smallest key. Falls back to a linear distance scan when no facility
/// attaches directly to the query node.
#[must_use]
pub fn nearest_via_mst(query: QueryPoint, facilities: &[Facility]) -> Option<FacilityMatch> {
    if facilities.is_empty() {
        return None;
    }

    let graph = FacilityGraph::build(query, facilities);
    let tree = graph.minimum_spanning_tree();

    let mut best: Option<(usize, f64)> = None;
    for node in 1..graph.node_count() {
        if tree.parent[node] == Some(0) && best.is_none_or(|(_, d)| tree.key[node] < d) {
            best = Some((node - 1, tree.key[node]));
        }
    }

    let (index, distance) = best.unwrap_or_else(|| {
        log::debug!("No facility attached to the query node in the MST, scanning linearly");
        linear_scan(&graph)
    });

    Some(to_match(&facilities[index], distance))
}

/// Index (into the facility slice) and distance of the closest facility by
/// direct distance. The first of equal distances wins.
fn linear_scan(graph: &FacilityGraph) -> (usize, f64) {
    let mut index = 0;
    let mut min = graph.weight(0, 1);
    for node in 2..graph.node_count() {
        let d = graph.weight(0, node);
        if d < min {
            min = d;
            index = node - 1;
        }
    }
    (index, min)
}

/// The `k` closest facilities, ascending by distance.
///
/// Ties keep input order. Facilities whose distance cannot be computed
/// (non-finite coordinates) are skipped.
#[must_use]
pub fn find_top_k_facilities(
    query: QueryPoint,
    facilities: &[Facility],
    k: usize,
) -> Vec<FacilityMatch> {
    let mut ranked: Vec<(usize, f64)> = facilities
        .iter()
        .enumerate()
        .map(|(i, f)| {
            (
                i,
                distance_km(query.latitude, query.longitude, f.latitude, f.longitude),
            )
        })
        .filter(|(_, d)| d.is_finite())
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(k);

    ranked
        .into_iter()
        .map(|(i, d)| to_match(&facilities[i], d))
        .collect()
}

/// The single nearest facility using the sorted-distance resolver.
#[must_use]
pub fn find_nearest_facility(query: QueryPoint, facilities: &[Facility]) -> Option<FacilityMatch> {
    find_top_k_facilities(query, facilities, 1).into_iter().next()
}

/// The single nearest facility using the given strategy.
#[must_use]
pub fn find_nearest_facility_with(
    query: QueryPoint,
    facilities: &[Facility],
    strategy: NearestStrategy,
) -> Option<FacilityMatch> {
    match strategy {
        NearestStrategy::Sorted => find_nearest_facility(query, facilities),
        NearestStrategy::Mst => nearest_via_mst(query, facilities),
    }
}
