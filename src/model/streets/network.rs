//! Routable street network over a directed petgraph graph
//!
//! The network is assembled once per routing session from an external
//! provider (already projected into the same CRS as the tile grid) and is
//! read-only afterward, so it can be shared across concurrent queries
//! without locking.

use geo::{Coord, LineString, Point};
use hashbrown::HashMap;
use log::info;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::model::streets::{EdgeId, StreetEdge, StreetNode};
use crate::{Error, NodeId};

/// R-tree entry: node position tagged with its graph index.
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Directed street network with a spatial index for node snapping.
pub struct StreetNetwork {
    pub graph: DiGraph<StreetNode, StreetEdge>,
    node_lookup: HashMap<NodeId, NodeIndex>,
    parallel_keys: HashMap<(NodeId, NodeId), u32>,
    index: RTree<IndexedPoint>,
}

impl StreetNetwork {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_lookup: HashMap::new(),
            parallel_keys: HashMap::new(),
            index: RTree::new(),
        }
    }

    /// Adds a node, or returns the existing index if the ID is known.
    pub fn add_node(&mut self, id: NodeId, geometry: Point<f64>) -> NodeIndex {
        if let Some(&idx) = self.node_lookup.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(StreetNode { id, geometry });
        self.node_lookup.insert(id, idx);
        self.index
            .insert(IndexedPoint::new([geometry.x(), geometry.y()], idx));
        idx
    }

    /// Adds a directed edge between two previously added nodes.
    ///
    /// Length is computed from the geometry in projected units. Parallel
    /// edges between the same node pair receive increasing keys in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIndex`] if either endpoint is unknown.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        geometry: LineString<f64>,
        travel_time: f64,
    ) -> Result<EdgeIndex, Error> {
        let source = *self
            .node_lookup
            .get(&from)
            .ok_or(Error::InvalidNodeIndex)?;
        let target = *self.node_lookup.get(&to).ok_or(Error::InvalidNodeIndex)?;

        let key = self.parallel_keys.entry((from, to)).or_insert(0);
        let id = EdgeId {
            from,
            to,
            key: *key,
        };
        *key += 1;

        let length = linestring_length(&geometry);
        let edge = StreetEdge {
            id,
            geometry,
            length,
            travel_time,
        };
        Ok(self.graph.add_edge(source, target, edge))
    }

    /// Graph index for a provider node ID.
    pub fn node_index(&self, id: NodeId) -> Result<NodeIndex, Error> {
        self.node_lookup
            .get(&id)
            .copied()
            .ok_or(Error::InvalidNodeIndex)
    }

    pub fn node_id(&self, idx: NodeIndex) -> Result<NodeId, Error> {
        self.graph
            .node_weight(idx)
            .map(|node| node.id)
            .ok_or(Error::InvalidNodeIndex)
    }

    /// Snaps a point to the nearest network node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPointsFound`] on an empty network.
    pub fn nearest_node(&self, point: Point<f64>) -> Result<NodeIndex, Error> {
        self.index
            .nearest_neighbor(&[point.x(), point.y()])
            .map(|entry| entry.data)
            .ok_or(Error::NoPointsFound)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(idx)
    }

    pub fn log_summary(&self) {
        info!(
            "Street network: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );
    }
}

impl Default for StreetNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// Euclidean length of a line string in projected units.
pub fn linestring_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| segment_length(segment.start, segment.end))
        .sum()
}

pub(crate) fn segment_length(start: Coord<f64>, end: Coord<f64>) -> f64 {
    (end.x - start.x).hypot(end.y - start.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn sample_network() -> StreetNetwork {
        let mut network = StreetNetwork::new();
        network.add_node(1, Point::new(0.0, 0.0));
        network.add_node(2, Point::new(100.0, 0.0));
        network.add_node(3, Point::new(100.0, 100.0));
        network
            .add_edge(1, 2, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)], 10.0)
            .unwrap();
        network
            .add_edge(
                2,
                3,
                line_string![(x: 100.0, y: 0.0), (x: 100.0, y: 100.0)],
                10.0,
            )
            .unwrap();
        network
    }

    #[test]
    fn edge_length_is_computed_from_geometry() {
        let network = sample_network();
        let edge = network.edge(EdgeIndex::new(0)).unwrap();
        assert!((edge.length - 100.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_edges_get_increasing_keys() {
        let mut network = sample_network();
        let second = network
            .add_edge(1, 2, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)], 12.0)
            .unwrap();
        assert_eq!(network.edge(second).unwrap().id.key, 1);
        assert_eq!(network.edge(EdgeIndex::new(0)).unwrap().id.key, 0);
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let mut network = sample_network();
        assert!(matches!(
            network.add_edge(1, 99, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)], 1.0),
            Err(Error::InvalidNodeIndex)
        ));
    }

    #[test]
    fn nearest_node_snaps_to_closest() {
        let network = sample_network();
        let idx = network.nearest_node(Point::new(95.0, 8.0)).unwrap();
        assert_eq!(network.node_id(idx).unwrap(), 2);

        let empty = StreetNetwork::new();
        assert!(matches!(
            empty.nearest_node(Point::new(0.0, 0.0)),
            Err(Error::NoPointsFound)
        ));
    }
}
