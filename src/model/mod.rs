//! Data model for risk-weighted routing
//!
//! Contains the tile grid, the risk surface consumed from the predictive
//! model, and the street network representation.

pub mod grid;
pub mod risk;
pub mod streets;

pub use grid::{Tile, TileGrid, TileId};
pub use risk::{RiskSurface, TileRiskTable, TimeBin};
pub use streets::{EdgeId, IndexedPoint, StreetEdge, StreetNetwork, StreetNode};
