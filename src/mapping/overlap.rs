//! Exact tile-edge overlap computation
//!
//! For every directed edge, the mapper determines which tiles the edge
//! passes through and what fraction of the edge's length lies inside each.
//! Tiles are axis-aligned squares, so clipping a segment against the grid
//! reduces to interval overlap against the vertical and horizontal grid
//! lines: each segment is split at every grid-line crossing and each piece
//! is attributed to the tile containing its midpoint.
//!
//! The mapping depends only on geometry, never on risk values or time, so
//! it is built once per (network, grid) pair and reused across queries.

use std::collections::BTreeMap;

use geo::Coord;
use log::info;
use petgraph::graph::EdgeIndex;
use rayon::prelude::*;

use crate::OVERLAP_EPSILON;
use crate::mapping::Fingerprint;
use crate::model::streets::network::segment_length;
use crate::model::{EdgeId, StreetEdge, StreetNetwork, TileGrid, TileId};

/// Per-edge ordered overlap sets, tagged with the fingerprint of the
/// (network, grid) configuration they were built from.
///
/// For each edge the fractions lie in (0, 1] and sum to at most 1; the sum
/// falls short of 1 exactly when part of the edge lies outside every tile,
/// and that uncovered remainder contributes zero risk.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEdgeMapping {
    fingerprint: Fingerprint,
    edge_ids: Vec<EdgeId>,
    overlaps: Vec<Vec<(TileId, f64)>>,
}

impl TileEdgeMapping {
    /// Computes the overlap mapping for every edge of the network.
    ///
    /// Deterministic: identical (network, grid) inputs produce identical
    /// mappings. Edges are processed in index order (rayon preserves it),
    /// and per-edge entries are ordered by tile ID.
    pub fn build(network: &StreetNetwork, grid: &TileGrid) -> Self {
        let fingerprint = Fingerprint::of(network, grid);
        let edges: Vec<&StreetEdge> = network.graph.edge_weights().collect();

        let overlaps: Vec<Vec<(TileId, f64)>> = edges
            .par_iter()
            .map(|edge| edge_overlaps(edge, grid))
            .collect();

        let mapped = overlaps.iter().filter(|tiles| !tiles.is_empty()).count();
        info!(
            "Tile-edge mapping built: {mapped} of {} edges intersect the grid",
            edges.len()
        );

        Self {
            fingerprint,
            edge_ids: edges.iter().map(|edge| edge.id).collect(),
            overlaps,
        }
    }

    pub(crate) fn from_parts(
        fingerprint: Fingerprint,
        edge_ids: Vec<EdgeId>,
        overlaps: Vec<Vec<(TileId, f64)>>,
    ) -> Self {
        Self {
            fingerprint,
            edge_ids,
            overlaps,
        }
    }

    /// Ordered (tile, fraction) overlaps of one edge. Empty for an edge
    /// fully outside the grid.
    pub fn overlaps(&self, edge: EdgeIndex) -> &[(TileId, f64)] {
        self.overlaps
            .get(edge.index())
            .map_or(&[], Vec::as_slice)
    }

    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_ids
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (EdgeId, &[(TileId, f64)])> + '_ {
        self.edge_ids
            .iter()
            .zip(&self.overlaps)
            .map(|(id, tiles)| (*id, tiles.as_slice()))
    }
}

/// Overlap fractions for a single edge.
///
/// Sub-lengths are accumulated per tile across all segments, so an edge
/// that loops back into the same tile contributes one summed entry.
fn edge_overlaps(edge: &StreetEdge, grid: &TileGrid) -> Vec<(TileId, f64)> {
    if edge.length <= 0.0 {
        return Vec::new();
    }

    let mut sub_lengths: BTreeMap<TileId, f64> = BTreeMap::new();
    for segment in edge.geometry.lines() {
        accumulate_segment(grid, segment.start, segment.end, &mut sub_lengths);
    }

    sub_lengths
        .into_iter()
        .filter_map(|(tile, sub_length)| {
            let fraction = (sub_length / edge.length).clamp(0.0, 1.0);
            (fraction > OVERLAP_EPSILON).then_some((tile, fraction))
        })
        .collect()
}

/// Splits one segment at every grid-line crossing and attributes each
/// piece to the tile containing its midpoint.
fn accumulate_segment(
    grid: &TileGrid,
    start: Coord<f64>,
    end: Coord<f64>,
    sub_lengths: &mut BTreeMap<TileId, f64>,
) {
    let length = segment_length(start, end);
    if length <= 0.0 {
        return;
    }

    let mut cuts = vec![0.0, 1.0];
    grid_line_cuts(
        start.x,
        end.x,
        grid.origin().x,
        grid.tile_side(),
        i64::from(grid.cols()),
        &mut cuts,
    );
    grid_line_cuts(
        start.y,
        end.y,
        grid.origin().y,
        grid.tile_side(),
        i64::from(grid.rows()),
        &mut cuts,
    );
    cuts.sort_by(f64::total_cmp);

    for pair in cuts.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        if t1 - t0 <= 0.0 {
            continue;
        }
        let mid = (t0 + t1) / 2.0;
        let point = Coord {
            x: start.x + (end.x - start.x) * mid,
            y: start.y + (end.y - start.y) * mid,
        };
        if let Some(tile) = grid.tile_at(point) {
            *sub_lengths.entry(tile).or_insert(0.0) += (t1 - t0) * length;
        }
    }
}

/// Parameters t in (0, 1) where the segment crosses a grid line on one
/// axis. Only lines inside the grid's extent are considered.
fn grid_line_cuts(
    start: f64,
    end: f64,
    origin: f64,
    side: f64,
    line_count: i64,
    cuts: &mut Vec<f64>,
) {
    let delta = end - start;
    if delta == 0.0 {
        return;
    }
    let (lo, hi) = if start < end { (start, end) } else { (end, start) };

    let first = ((lo - origin) / side).ceil().max(0.0) as i64;
    let last = ((hi - origin) / side).floor().min(line_count as f64) as i64;
    for k in first..=last {
        let t = (origin + k as f64 * side - start) / delta;
        if t > 0.0 && t < 1.0 {
            cuts.push(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, Rect, line_string};

    fn grid_3x3() -> TileGrid {
        let boundary = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 3000.0, y: 3000.0 });
        TileGrid::build(&boundary, 1000.0, "EPSG:32613").unwrap()
    }

    fn fraction_sum(tiles: &[(TileId, f64)]) -> f64 {
        tiles.iter().map(|(_, fraction)| fraction).sum()
    }

    #[test]
    fn diagonal_edge_splits_evenly_between_two_tiles() {
        // Runs from the center of tile (0,0) to the center of tile (1,1),
        // crossing the corner: the two end tiles carry ~50% each.
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(500.0, 500.0));
        network.add_node(2, Point::new(1500.0, 1500.0));
        network
            .add_edge(
                1,
                2,
                line_string![(x: 500.0, y: 500.0), (x: 1500.0, y: 1500.0)],
                60.0,
            )
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        let tiles = mapping.overlaps(EdgeIndex::new(0));
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].0, TileId { row: 0, col: 0 });
        assert_eq!(tiles[1].0, TileId { row: 1, col: 1 });
        assert!((tiles[0].1 - 0.5).abs() < 1e-9);
        assert!((tiles[1].1 - 0.5).abs() < 1e-9);
        assert!((fraction_sum(tiles) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edge_outside_grid_has_empty_overlap_set() {
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(-5000.0, -5000.0));
        network.add_node(2, Point::new(-4000.0, -5000.0));
        network
            .add_edge(
                1,
                2,
                line_string![(x: -5000.0, y: -5000.0), (x: -4000.0, y: -5000.0)],
                60.0,
            )
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        assert!(mapping.overlaps(EdgeIndex::new(0)).is_empty());
    }

    #[test]
    fn partially_covered_edge_sums_below_one() {
        // Half inside the grid, half outside to the west.
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(-1000.0, 500.0));
        network.add_node(2, Point::new(1000.0, 500.0));
        network
            .add_edge(
                1,
                2,
                line_string![(x: -1000.0, y: 500.0), (x: 1000.0, y: 500.0)],
                60.0,
            )
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        let tiles = mapping.overlaps(EdgeIndex::new(0));
        assert!((fraction_sum(tiles) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn looping_edge_merges_revisited_tiles() {
        // Out of tile (0,0) into (0,1) and back: one entry per tile.
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(800.0, 500.0));
        network.add_node(2, Point::new(900.0, 500.0));
        network
            .add_edge(
                1,
                2,
                line_string![
                    (x: 800.0, y: 500.0),
                    (x: 1200.0, y: 500.0),
                    (x: 900.0, y: 500.0),
                ],
                60.0,
            )
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        let tiles = mapping.overlaps(EdgeIndex::new(0));
        assert_eq!(tiles.len(), 2);
        // 400 out + 300 back = 700 total; 200 out + 200 back in tile (0,1).
        let in_second: f64 = tiles
            .iter()
            .find(|(tile, _)| *tile == TileId { row: 0, col: 1 })
            .map(|(_, fraction)| *fraction)
            .unwrap();
        assert!((in_second - 400.0 / 700.0).abs() < 1e-9);
        assert!((fraction_sum(tiles) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_edge_is_dropped_not_an_error() {
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(500.0, 500.0));
        network.add_node(2, Point::new(500.0, 500.0));
        network
            .add_edge(1, 2, line_string![(x: 500.0, y: 500.0), (x: 500.0, y: 500.0)], 0.0)
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        assert!(mapping.overlaps(EdgeIndex::new(0)).is_empty());
    }

    #[test]
    fn boundary_touching_edge_leaves_no_residue() {
        // Rides exactly along the shared boundary between two tile rows;
        // the half-open rule attributes the whole edge to the upper row.
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(100.0, 1000.0));
        network.add_node(2, Point::new(900.0, 1000.0));
        network
            .add_edge(
                1,
                2,
                line_string![(x: 100.0, y: 1000.0), (x: 900.0, y: 1000.0)],
                60.0,
            )
            .unwrap();

        let mapping = TileEdgeMapping::build(&network, &grid_3x3());
        let tiles = mapping.overlaps(EdgeIndex::new(0));
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].0, TileId { row: 1, col: 0 });
        assert!((tiles[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn build_is_deterministic_on_randomized_inputs() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(7);
        let mut network = StreetNetwork::new();
        for id in 0..200u64 {
            let x = rng.gen_range(-500.0..3500.0);
            let y = rng.gen_range(-500.0..3500.0);
            network.add_node(id, Point::new(x, y));
        }
        for _ in 0..400 {
            let from = rng.gen_range(0..200u64);
            let to = rng.gen_range(0..200u64);
            if from == to {
                continue;
            }
            let from_point = {
                let idx = network.node_index(from).unwrap();
                network.graph[idx].geometry
            };
            let to_point = {
                let idx = network.node_index(to).unwrap();
                network.graph[idx].geometry
            };
            network
                .add_edge(
                    from,
                    to,
                    line_string![
                        (x: from_point.x(), y: from_point.y()),
                        (x: to_point.x(), y: to_point.y()),
                    ],
                    30.0,
                )
                .unwrap();
        }

        let grid = grid_3x3();
        let first = TileEdgeMapping::build(&network, &grid);
        let second = TileEdgeMapping::build(&network, &grid);
        assert_eq!(first, second);

        // Conservation holds for every edge.
        for idx in 0..first.len() {
            let sum = fraction_sum(first.overlaps(EdgeIndex::new(idx)));
            assert!(sum <= 1.0 + 1e-9);
        }
    }
}
