//! Street network model - nodes, edges, and the routable graph

pub mod components;
pub mod network;

pub use components::{EdgeId, StreetEdge, StreetNode};
pub use network::{IndexedPoint, StreetNetwork};
