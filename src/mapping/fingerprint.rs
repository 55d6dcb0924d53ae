//! Stable fingerprint of a (network, tile grid) configuration
//!
//! The tile-edge mapping is a content-addressed artifact: it may only be
//! reused for the exact network and grid it was built from. The
//! fingerprint hashes a canonical byte serialization of both with FNV-1a,
//! which is stable across runs and platforms (std's hasher is not, which
//! would invalidate persisted artifacts on a toolchain upgrade).

use serde::{Deserialize, Serialize};

use crate::model::{StreetNetwork, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint of a (network, grid) pair.
    ///
    /// Covers the grid configuration and every node and edge of the
    /// network in index order, including edge geometry, so any change that
    /// could alter the overlap mapping changes the fingerprint.
    pub fn of(network: &StreetNetwork, grid: &TileGrid) -> Self {
        let mut hasher = Fnv1a::new();

        hasher.write_f64(grid.origin().x);
        hasher.write_f64(grid.origin().y);
        hasher.write_f64(grid.tile_side());
        hasher.write_u32(grid.rows());
        hasher.write_u32(grid.cols());
        hasher.write_bytes(grid.crs().as_bytes());

        hasher.write_u64(network.node_count() as u64);
        for node in network.graph.node_weights() {
            hasher.write_u64(node.id);
            hasher.write_f64(node.geometry.x());
            hasher.write_f64(node.geometry.y());
        }

        hasher.write_u64(network.edge_count() as u64);
        for edge in network.graph.edge_weights() {
            hasher.write_u64(edge.id.from);
            hasher.write_u64(edge.id.to);
            hasher.write_u32(edge.id.key);
            hasher.write_f64(edge.length);
            for coord in edge.geometry.coords() {
                hasher.write_f64(coord.x);
                hasher.write_f64(coord.y);
            }
        }

        Self(hasher.finish())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Minimal FNV-1a, kept inline for a platform-stable digest.
struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_bits().to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
