use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::StreetNetwork;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Min-heap by cost (reversed from standard Rust BinaryHeap); node index
// breaks cost ties so traversal order is fully deterministic.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Traced shortest path under an external per-edge weight vector.
#[derive(Debug, Clone)]
pub(crate) struct TracedPath {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
}

/// Dijkstra's algorithm over strictly positive weights, tracing the edge
/// sequence of the best path to `target`.
///
/// Relaxation keeps a predecessor only on strict improvement, so among
/// equal-weight paths the first one discovered by the deterministic
/// traversal order wins. Returns `None` when `target` is unreachable.
pub(crate) fn dijkstra_trace(
    network: &StreetNetwork,
    weights: &[f64],
    start: NodeIndex,
    target: NodeIndex,
) -> Option<TracedPath> {
    let estimated_nodes = network.graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for edge in network.graph.edges(node) {
            let next = edge.target();
            let next_cost = cost + weights[edge.id().index()];

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, (node, edge.id()));
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, (node, edge.id()));
                    }
                }
            }
        }
    }

    if target != start && !predecessors.contains_key(&target) {
        return None;
    }

    // Follow predecessors backward from target to start
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;
    while current != start {
        let &(prev, via) = predecessors.get(&current)?;
        nodes.push(prev);
        edges.push(via);
        current = prev;
    }
    nodes.reverse();
    edges.reverse();

    Some(TracedPath {
        nodes,
        edges,
        cost: distances.get(&target).copied()?,
    })
}
