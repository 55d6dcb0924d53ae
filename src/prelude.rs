// Re-export key components
pub use crate::mapping::{Fingerprint, MappingStore, TileEdgeMapping};
pub use crate::model::{
    EdgeId, RiskSurface, StreetEdge, StreetNetwork, StreetNode, Tile, TileGrid, TileId,
    TileRiskTable, TimeBin,
};
pub use crate::routing::{RiskReduction, RouteResult, compare, shortest_path};
pub use crate::weighting::{WeightPolicy, edge_risk, edge_weight, weight_graph};

// Core constants and aliases
pub use crate::{Error, MIN_WEIGHT, NodeId, OVERLAP_EPSILON};
