//! Edge weighting policies
//!
//! Turns a risk surface query plus the fixed tile-edge mapping into
//! per-edge routing weights. Weighting is a pure function of its inputs;
//! the weighted view is always derived, never stored as ground truth.

use petgraph::graph::EdgeIndex;

use crate::MIN_WEIGHT;
use crate::mapping::TileEdgeMapping;
use crate::model::{RiskSurface, StreetEdge, StreetNetwork, TimeBin};

/// Closed set of weighting policies.
///
/// The formulas are small and fixed by the risk model's semantics, so new
/// policies are added here rather than behind an open-ended callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightPolicy {
    /// Weight = edge length; risk ignored.
    Distance,
    /// Weight = free-flow travel time; risk ignored.
    TravelTime,
    /// Weight = length x (1 + risk): a multiplicative penalty that stays
    /// strictly positive and scales with edge length, so a long risky
    /// edge is penalized more than a short one of equal risk density.
    RiskAware,
    /// Weight tracks risk density alone; distance only breaks ties.
    RiskOnly,
}

impl WeightPolicy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::TravelTime => "travel_time",
            Self::RiskAware => "risk_aware",
            Self::RiskOnly => "risk_only",
        }
    }
}

impl std::fmt::Display for WeightPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Risk of one edge: the length-fraction-weighted sum of tile scores.
///
/// Fractions sum to at most 1 and every score is in [0, 1], so the result
/// is a convex combination bounded in [0, 1]. Edges outside the grid (or
/// in unscored tiles) come out at exactly 0.
pub fn edge_risk(
    mapping: &TileEdgeMapping,
    surface: &dyn RiskSurface,
    bin: TimeBin,
    edge: EdgeIndex,
) -> f64 {
    let risk: f64 = mapping
        .overlaps(edge)
        .iter()
        .map(|&(tile, fraction)| surface.score(tile, bin) * fraction)
        .sum();
    risk.clamp(0.0, 1.0)
}

/// Routing weight of one edge under a policy.
///
/// Always strictly positive, as Dijkstra-class search requires: degenerate
/// inputs are floored at [`MIN_WEIGHT`].
pub fn edge_weight(policy: WeightPolicy, edge: &StreetEdge, risk: f64) -> f64 {
    let weight = match policy {
        WeightPolicy::Distance => edge.length,
        WeightPolicy::TravelTime => edge.travel_time,
        WeightPolicy::RiskAware => edge.length * (1.0 + risk),
        WeightPolicy::RiskOnly => edge.length * risk + edge.length * MIN_WEIGHT,
    };
    weight.max(MIN_WEIGHT)
}

/// Per-edge weight vector for the whole network, indexed by edge index.
///
/// Pure function of its inputs; recomputed whenever a different time bin
/// or risk surface is queried.
pub fn weight_graph(
    policy: WeightPolicy,
    network: &StreetNetwork,
    mapping: &TileEdgeMapping,
    surface: &dyn RiskSurface,
    bin: TimeBin,
) -> Vec<f64> {
    network
        .graph
        .edge_indices()
        .map(|idx| {
            let edge = &network.graph[idx];
            let risk = edge_risk(mapping, surface, bin, idx);
            edge_weight(policy, edge, risk)
        })
        .collect()
}
