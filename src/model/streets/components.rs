//! Street network components - nodes and directed edges

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Identity of a directed edge: origin, destination, and a discriminator
/// for parallel edges between the same node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    pub from: NodeId,
    pub to: NodeId,
    pub key: u32,
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.from, self.to, self.key)
    }
}

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Provider-assigned stable ID of the node
    pub id: NodeId,
    /// Node coordinates in the projected CRS
    pub geometry: Point<f64>,
}

/// Street graph edge (directed street segment)
///
/// A bidirectional street yields two edges with independent geometries.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub id: EdgeId,
    /// Directed line geometry in the projected CRS
    pub geometry: LineString<f64>,
    /// Length in projected distance units, derived from the geometry
    pub length: f64,
    /// Free-flow travel time in seconds, supplied by the provider
    pub travel_time: f64,
}
