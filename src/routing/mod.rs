//! Shortest-path search and route comparison under weighting policies

pub mod dijkstra;
pub mod route;

pub use route::{RiskReduction, RouteResult, compare, shortest_path};
