//! Risk surface consumed from the predictive model
//!
//! The engine treats the model as an opaque scorer: a probability in
//! [0, 1] per (tile, time bin). Tiles or bins the model never scored
//! default to exactly 0.0 — the cold-start convention, under which absence
//! of history means zero assumed risk rather than "unknown".

use chrono::{DateTime, Timelike, Utc};
use hashbrown::HashMap;

use crate::model::TileId;

/// Discrete hourly interval for which a risk score is predicted.
///
/// Stored as whole hours since the Unix epoch so bins are cheap keys and
/// arithmetic over prediction windows is integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBin(pub i64);

impl TimeBin {
    /// Floors a wall-clock instant to its hourly bin.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let floored = at
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(at);
        Self(floored.timestamp() / 3600)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Pure read interface over per-tile risk predictions.
///
/// Implementations must be idempotent: the same (tile, bin) query always
/// yields the same score, and scores stay within [0, 1].
pub trait RiskSurface: Sync {
    /// Predicted risk probability for a tile during a time bin.
    ///
    /// Returns exactly 0.0 for any (tile, bin) pair absent from the
    /// surface.
    fn score(&self, tile: TileId, bin: TimeBin) -> f64;
}

/// In-memory risk surface backed by a hash map.
///
/// Scores are clamped to [0, 1] on insert so a sloppy upstream model can
/// never break the boundedness contract downstream weighting relies on.
#[derive(Debug, Clone, Default)]
pub struct TileRiskTable {
    scores: HashMap<(TileId, TimeBin), f64>,
}

impl TileRiskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: TileId, bin: TimeBin, score: f64) {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        self.scores.insert((tile, bin), score);
    }

    /// Collapses a multi-hour prediction window into a single bin holding
    /// the per-tile maximum, the way a "next N hours" forecast is consumed
    /// for routing.
    pub fn max_over_window(predictions: &Self, start: TimeBin, hours: u32, out_bin: TimeBin) -> Self {
        let mut table = Self::new();
        let mut maxima: HashMap<TileId, f64> = HashMap::new();
        for offset in 0..i64::from(hours) {
            let bin = TimeBin(start.0 + offset);
            for (&(tile, b), &score) in &predictions.scores {
                if b == bin {
                    let entry = maxima.entry(tile).or_insert(0.0);
                    if score > *entry {
                        *entry = score;
                    }
                }
            }
        }
        for (tile, score) in maxima {
            table.insert(tile, out_bin, score);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl RiskSurface for TileRiskTable {
    fn score(&self, tile: TileId, bin: TimeBin) -> f64 {
        self.scores.get(&(tile, bin)).copied().unwrap_or(0.0)
    }
}
