//! Route results, per-policy comparison, and common-scale risk metrics

use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::mapping::TileEdgeMapping;
use crate::model::{EdgeId, RiskSurface, StreetNetwork, TimeBin};
use crate::routing::dijkstra::dijkstra_trace;
use crate::weighting::{WeightPolicy, edge_risk, weight_graph};
use crate::{Error, NodeId};

/// One route under one policy, with aggregate metrics.
///
/// The risk integral is computed on the common risk scale regardless of
/// the policy used to find the route, so routes found under different
/// policies are directly comparable.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub policy: WeightPolicy,
    /// Node sequence from origin to destination.
    pub nodes: Vec<NodeId>,
    /// Edge sequence; each edge's destination is the next edge's origin.
    pub edges: Vec<EdgeId>,
    /// Total length in projected units.
    pub total_length: f64,
    /// Sum of edge_risk x edge_length over the path.
    pub risk_integral: f64,
    /// Sum of free-flow travel times in seconds.
    pub travel_time: f64,
    pub edge_count: usize,
    /// Total weight under the policy that produced the route.
    pub total_weight: f64,
}

/// Shortest path between two graph nodes under one weighting policy.
///
/// # Errors
///
/// Returns [`Error::NoRoute`] when the destination is not reachable from
/// the origin, and [`Error::InvalidNodeIndex`] for unknown nodes.
pub fn shortest_path(
    network: &StreetNetwork,
    mapping: &TileEdgeMapping,
    surface: &dyn RiskSurface,
    bin: TimeBin,
    policy: WeightPolicy,
    origin: NodeIndex,
    destination: NodeIndex,
) -> Result<RouteResult, Error> {
    let origin_id = network.node_id(origin)?;
    let destination_id = network.node_id(destination)?;

    let weights = weight_graph(policy, network, mapping, surface, bin);
    let path = dijkstra_trace(network, &weights, origin, destination).ok_or(Error::NoRoute {
        from: origin_id,
        to: destination_id,
    })?;

    let mut total_length = 0.0;
    let mut risk_integral = 0.0;
    let mut travel_time = 0.0;
    let mut edges = Vec::with_capacity(path.edges.len());
    for &idx in &path.edges {
        let edge = network.edge(idx).ok_or(Error::InvalidNodeIndex)?;
        total_length += edge.length;
        risk_integral += edge_risk(mapping, surface, bin, idx) * edge.length;
        travel_time += edge.travel_time;
        edges.push(edge.id);
    }

    let nodes = path
        .nodes
        .iter()
        .map(|&idx| network.node_id(idx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteResult {
        policy,
        nodes,
        edge_count: edges.len(),
        edges,
        total_length,
        risk_integral,
        travel_time,
        total_weight: path.cost,
    })
}

/// Runs `shortest_path` once per policy over the same graph topology.
///
/// Policies run in parallel; each reports its own result, so a
/// disconnected origin/destination yields [`Error::NoRoute`] for every
/// policy rather than a partial comparison.
pub fn compare(
    network: &StreetNetwork,
    mapping: &TileEdgeMapping,
    surface: &dyn RiskSurface,
    bin: TimeBin,
    policies: &[WeightPolicy],
    origin: NodeIndex,
    destination: NodeIndex,
) -> Vec<(WeightPolicy, Result<RouteResult, Error>)> {
    policies
        .par_iter()
        .map(|&policy| {
            (
                policy,
                shortest_path(network, mapping, surface, bin, policy, origin, destination),
            )
        })
        .collect()
}

/// Trade-off statistics between a risk-aware route and a baseline route.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReduction {
    /// Percentage of the baseline's risk integral avoided.
    pub risk_reduction_pct: f64,
    pub absolute_risk_reduction: f64,
    /// Extra length of the safe route in projected units.
    pub length_difference: f64,
    pub length_increase_pct: f64,
    pub safe_route_risk: f64,
    pub baseline_risk: f64,
}

impl RiskReduction {
    pub fn between(safe: &RouteResult, baseline: &RouteResult) -> Self {
        let baseline_risk = baseline.risk_integral;
        let safe_risk = safe.risk_integral;

        let risk_reduction_pct = if baseline_risk == 0.0 {
            0.0
        } else {
            (baseline_risk - safe_risk) / baseline_risk * 100.0
        };
        let length_difference = safe.total_length - baseline.total_length;
        let length_increase_pct = if baseline.total_length == 0.0 {
            0.0
        } else {
            length_difference / baseline.total_length * 100.0
        };

        Self {
            risk_reduction_pct,
            absolute_risk_reduction: baseline_risk - safe_risk,
            length_difference,
            length_increase_pct,
            safe_route_risk: safe_risk,
            baseline_risk,
        }
    }
}
