//! Fingerprint-keyed cache and persistence for tile-edge mappings
//!
//! The mapping build walks every edge of the network, so it is computed
//! once per (network, grid) fingerprint and cached forever. The store is
//! an explicit arena passed by reference, not process-wide state, so
//! multiple network/grid configurations can coexist.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use hashbrown::HashMap;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::mapping::{Fingerprint, TileEdgeMapping};
use crate::model::{EdgeId, StreetNetwork, TileGrid, TileId};
use crate::Error;

type MappingCell = Arc<OnceLock<Arc<TileEdgeMapping>>>;

/// Session-owned arena of tile-edge mappings keyed by fingerprint.
#[derive(Default)]
pub struct MappingStore {
    entries: Mutex<HashMap<Fingerprint, MappingCell>>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapping for this (network, grid) pair, building it on
    /// first use.
    ///
    /// Concurrent first-time callers single-flight the build: one caller
    /// computes while the others block on the cell and then share the
    /// result.
    pub fn get_or_build(&self, network: &StreetNetwork, grid: &TileGrid) -> Arc<TileEdgeMapping> {
        let fingerprint = Fingerprint::of(network, grid);
        let cell = self.cell(fingerprint);
        cell.get_or_init(|| Arc::new(TileEdgeMapping::build(network, grid)))
            .clone()
    }

    /// Registers an already built (e.g. loaded) mapping under its own
    /// fingerprint. A mapping already cached for that fingerprint wins.
    pub fn insert(&self, mapping: TileEdgeMapping) -> Arc<TileEdgeMapping> {
        let cell = self.cell(mapping.fingerprint());
        cell.get_or_init(|| Arc::new(mapping)).clone()
    }

    pub fn get(&self, fingerprint: Fingerprint) -> Option<Arc<TileEdgeMapping>> {
        let entries = self.entries.lock().expect("mapping store lock poisoned");
        entries.get(&fingerprint).and_then(|cell| cell.get().cloned())
    }

    fn cell(&self, fingerprint: Fingerprint) -> MappingCell {
        let mut entries = self.entries.lock().expect("mapping store lock poisoned");
        entries.entry(fingerprint).or_default().clone()
    }
}

/// On-disk form: edge identity to ordered (tile, fraction) pairs, tagged
/// with the fingerprint of the configuration it was built from.
#[derive(Serialize, Deserialize)]
struct MappingArtifact {
    fingerprint: Fingerprint,
    edges: Vec<ArtifactEdge>,
}

#[derive(Serialize, Deserialize)]
struct ArtifactEdge {
    id: EdgeId,
    tiles: Vec<(TileId, f64)>,
}

impl TileEdgeMapping {
    /// Persists the mapping as a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let artifact = MappingArtifact {
            fingerprint: self.fingerprint(),
            edges: self
                .entries()
                .map(|(id, tiles)| ArtifactEdge {
                    id,
                    tiles: tiles.to_vec(),
                })
                .collect(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &artifact)
            .map_err(|e| Error::InvalidData(format!("failed to serialize mapping: {e}")))?;
        info!("Saved tile-edge mapping to {}", path.display());
        Ok(())
    }

    /// Loads a persisted mapping for the given (network, grid) pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if the artifact was built from a
    /// different configuration. The caller decides whether to force a
    /// rebuild; a mismatch is never resolved silently.
    pub fn load(path: &Path, network: &StreetNetwork, grid: &TileGrid) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: MappingArtifact = serde_json::from_reader(reader)
            .map_err(|e| Error::InvalidData(format!("failed to parse mapping: {e}")))?;

        let expected = Fingerprint::of(network, grid);
        if artifact.fingerprint != expected {
            return Err(Error::Integrity {
                expected: expected.to_string(),
                found: artifact.fingerprint.to_string(),
            });
        }
        if artifact.edges.len() != network.edge_count() {
            return Err(Error::InvalidData(format!(
                "mapping covers {} edges, network has {}",
                artifact.edges.len(),
                network.edge_count()
            )));
        }

        let mut edge_ids = Vec::with_capacity(artifact.edges.len());
        let mut overlaps = Vec::with_capacity(artifact.edges.len());
        for (entry, edge) in artifact
            .edges
            .into_iter()
            .zip_eq(network.graph.edge_weights())
        {
            if entry.id != edge.id {
                return Err(Error::InvalidData(format!(
                    "mapping edge {} does not match network edge {}",
                    entry.id, edge.id
                )));
            }
            edge_ids.push(entry.id);
            overlaps.push(entry.tiles);
        }

        info!("Loaded tile-edge mapping from {}", path.display());
        Ok(Self::from_parts(expected, edge_ids, overlaps))
    }
}
