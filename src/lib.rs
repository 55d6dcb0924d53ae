//! Risk-weighted street routing over a predictive tile grid.
//!
//! The engine builds an exact geometric correspondence between a directed
//! street network and a square tile grid, folds per-tile risk predictions
//! into per-edge weights, and runs shortest-path searches under named
//! weighting policies so that safe and fast routes can be compared on a
//! common risk scale.

pub mod error;
pub mod mapping;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod weighting;

pub use error::Error;

/// Stable node identifier assigned by the street network provider.
pub type NodeId = u64;

/// Overlap fractions below this relative threshold are treated as
/// floating-point residue from shared-boundary geometry and dropped.
pub const OVERLAP_EPSILON: f64 = 1e-9;

/// Lower bound applied to every routing weight. Keeps degenerate inputs
/// (zero-length edges, missing travel times) from producing a weight
/// Dijkstra cannot handle.
pub const MIN_WEIGHT: f64 = 1e-6;
