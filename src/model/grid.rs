//! Square tile grid over the region of interest
//!
//! Tiles are axis-aligned squares in a projected (distance-accurate)
//! coordinate reference. The grid covers the bounding rectangle of the
//! region; point location uses half-open `[min, max)` intervals on each
//! axis so a point on a shared tile boundary is assigned to exactly one
//! tile.

use geo::{Coord, Rect};
use log::info;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Stable composite tile key: row/column offsets from the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub row: u32,
    pub col: u32,
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tile_{}_{}", self.row, self.col)
    }
}

/// A single grid cell: identity plus square geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub geometry: Rect<f64>,
}

/// Non-overlapping square tessellation of a bounding region.
///
/// Built once per region configuration and immutable afterward. Tile
/// geometry is derived from the origin and side length, so the grid is
/// fully described by a handful of scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    origin: Coord<f64>,
    tile_side: f64,
    rows: u32,
    cols: u32,
    crs: String,
}

impl TileGrid {
    /// Builds a grid of square tiles covering `boundary`.
    ///
    /// The boundary must already be in the projected CRS named by `crs`;
    /// `tile_side` is in the same distance units.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the tile side is not a positive
    /// finite number or the boundary is degenerate.
    pub fn build(boundary: &Rect<f64>, tile_side: f64, crs: &str) -> Result<Self, Error> {
        if !tile_side.is_finite() || tile_side <= 0.0 {
            return Err(Error::Configuration(format!(
                "tile side length must be positive, got {tile_side}"
            )));
        }
        if boundary.width() <= 0.0 || boundary.height() <= 0.0 {
            return Err(Error::Configuration(
                "region boundary is empty or degenerate".to_string(),
            ));
        }

        let cols = (boundary.width() / tile_side).ceil() as u32;
        let rows = (boundary.height() / tile_side).ceil() as u32;

        let grid = Self {
            origin: boundary.min(),
            tile_side,
            rows,
            cols,
            crs: crs.to_string(),
        };
        info!(
            "Built tile grid: {} tiles ({rows} rows x {cols} cols), side {tile_side} in {crs}",
            grid.len()
        );
        Ok(grid)
    }

    /// Locates the tile containing `point`, or `None` outside the grid.
    ///
    /// Assignment is half-open per axis: a point exactly on the boundary
    /// between two tiles belongs to the tile whose `[min, max)` interval
    /// contains it.
    pub fn tile_at(&self, point: Coord<f64>) -> Option<TileId> {
        let dx = point.x - self.origin.x;
        let dy = point.y - self.origin.y;
        if dx < 0.0 || dy < 0.0 {
            return None;
        }
        let col = (dx / self.tile_side).floor() as u32;
        let row = (dy / self.tile_side).floor() as u32;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(TileId { row, col })
    }

    /// Square geometry of a tile.
    pub fn tile_rect(&self, id: TileId) -> Rect<f64> {
        let min = Coord {
            x: self.origin.x + f64::from(id.col) * self.tile_side,
            y: self.origin.y + f64::from(id.row) * self.tile_side,
        };
        let max = Coord {
            x: min.x + self.tile_side,
            y: min.y + self.tile_side,
        };
        Rect::new(min, max)
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).map(move |col| {
                let id = TileId { row, col };
                Tile {
                    id,
                    geometry: self.tile_rect(id),
                }
            })
        })
    }

    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    pub fn tile_side(&self) -> f64 {
        self.tile_side
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(width: f64, height: f64) -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: width, y: height })
    }

    #[test]
    fn build_covers_boundary_with_ceiling() {
        let grid = TileGrid::build(&region(2500.0, 1000.0), 1000.0, "EPSG:32613").unwrap();
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn rejects_bad_tile_side() {
        for side in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                TileGrid::build(&region(100.0, 100.0), side, "EPSG:32613"),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_degenerate_boundary() {
        let flat = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 0.0 });
        assert!(matches!(
            TileGrid::build(&flat, 10.0, "EPSG:32613"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn point_location_is_half_open_on_boundaries() {
        let grid = TileGrid::build(&region(3000.0, 3000.0), 1000.0, "EPSG:32613").unwrap();
        // Interior boundary belongs to the higher tile.
        assert_eq!(
            grid.tile_at(Coord { x: 1000.0, y: 500.0 }),
            Some(TileId { row: 0, col: 1 })
        );
        // Grid origin is inside the first tile.
        assert_eq!(
            grid.tile_at(Coord { x: 0.0, y: 0.0 }),
            Some(TileId { row: 0, col: 0 })
        );
        // The far edge of the grid is outside.
        assert_eq!(grid.tile_at(Coord { x: 3000.0, y: 100.0 }), None);
        assert_eq!(grid.tile_at(Coord { x: -0.1, y: 100.0 }), None);
    }

    #[test]
    fn tile_rect_round_trips_through_tile_at() {
        let grid = TileGrid::build(&region(5000.0, 4000.0), 500.0, "EPSG:32613").unwrap();
        for tile in grid.tiles() {
            let center = tile.geometry.center();
            assert_eq!(grid.tile_at(center), Some(tile.id));
        }
    }
}
