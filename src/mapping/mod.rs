//! Tile-edge correspondence: exact geometric overlap between every street
//! edge and the tiles it passes through, plus the fingerprint-keyed cache
//! and persistence for reusing the mapping across sessions.

pub mod fingerprint;
pub mod overlap;
pub mod store;

pub use fingerprint::Fingerprint;
pub use overlap::TileEdgeMapping;
pub use store::MappingStore;
