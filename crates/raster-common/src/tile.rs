//! Tile addressing and the tile-grid seam.
//!
//! `TileGrid` is the geometric model a tile source depends on: which tile a
//! coordinate falls in at a zoom, and what extent that tile covers.
//! `WebMercatorTileGrid` is the standard XYZ grid (EPSG:3857, top-left
//! origin, rows growing southward).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DEFAULT_TILE_SIZE;

/// Half the width of the Web Mercator world in meters.
pub const WEB_MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Deepest zoom level served by the Web Mercator grid.
pub const MAX_ZOOM: u32 = 22;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the top
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether the coordinate exists in a 2^z × 2^z grid.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Identity of a retained grid in a value cache.
///
/// The default scheme keys on column and row only, so tiles at different
/// zooms that share `(x, y)` replace each other. `with_zoom` builds the
/// zoom-qualified key used when that collision is unwanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub z: Option<u32>,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(x: u32, y: u32) -> Self {
        Self { z: None, x, y }
    }

    pub fn with_zoom(z: u32, x: u32, y: u32) -> Self {
        Self { z: Some(z), x, y }
    }

    /// Build a key for `coord`, optionally keeping its zoom.
    pub fn for_tile(coord: TileCoord, include_zoom: bool) -> Self {
        if include_zoom {
            Self::with_zoom(coord.z, coord.x, coord.y)
        } else {
            Self::new(coord.x, coord.y)
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "{}-{}-{}", z, self.x, self.y),
            None => write!(f, "{}-{}", self.x, self.y),
        }
    }
}

/// A projected map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Project WGS84 longitude/latitude (degrees) to Web Mercator meters.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        // Mercator is undefined at the poles
        let lat = lat.clamp(-85.051_128_779_806_59, 85.051_128_779_806_59);
        let x = lon.to_radians() * 6378137.0;
        let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * 6378137.0;
        Self { x, y }
    }
}

/// Geographic extent of a tile: `(min_x, min_y, max_x, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.x >= self.min_x
            && coord.x <= self.max_x
            && coord.y >= self.min_y
            && coord.y <= self.max_y
    }
}

/// Mapping between map coordinates, zoom levels and tiles.
pub trait TileGrid: Send + Sync {
    /// Tile containing `coord` at integer zoom `z`, if it lies on the grid.
    fn tile_for_coord_and_zoom(&self, coord: Coordinate, z: u32) -> Option<TileCoord>;

    /// Extent covered by `tile`.
    fn extent_for_tile(&self, tile: TileCoord) -> Extent;

    /// Tile edge length in pixels.
    fn tile_size(&self) -> u32;
}

/// Standard XYZ grid over EPSG:3857.
#[derive(Debug, Clone, Copy)]
pub struct WebMercatorTileGrid {
    tile_size: u32,
}

impl WebMercatorTileGrid {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Width of one tile in meters at zoom `z`.
    fn tile_span(z: u32) -> f64 {
        2.0 * WEB_MERCATOR_MAX_EXTENT / (1u64 << z) as f64
    }
}

impl Default for WebMercatorTileGrid {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl TileGrid for WebMercatorTileGrid {
    fn tile_for_coord_and_zoom(&self, coord: Coordinate, z: u32) -> Option<TileCoord> {
        if z > MAX_ZOOM || !coord.x.is_finite() || !coord.y.is_finite() {
            return None;
        }
        let span = Self::tile_span(z);
        let n = (1u64 << z) as i64;

        let col = ((coord.x + WEB_MERCATOR_MAX_EXTENT) / span).floor() as i64;
        let row = ((WEB_MERCATOR_MAX_EXTENT - coord.y) / span).floor() as i64;

        if col < 0 || row < 0 || col >= n || row >= n {
            return None;
        }

        Some(TileCoord::new(z, col as u32, row as u32))
    }

    fn extent_for_tile(&self, tile: TileCoord) -> Extent {
        let span = Self::tile_span(tile.z);
        let min_x = -WEB_MERCATOR_MAX_EXTENT + tile.x as f64 * span;
        let max_y = WEB_MERCATOR_MAX_EXTENT - tile.y as f64 * span;
        Extent::new(min_x, max_y - span, min_x + span, max_y)
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }
}
