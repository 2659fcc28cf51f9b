//! Shared helpers for tile-server integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use raster_common::{
    Coordinate, RasterError, RasterResult, SampleGrid, TileCoord, TileGrid, WebMercatorTileGrid,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use test_utils::encode_geotiff_f32;
use tile_server::fetch::TileFetcher;

pub const URL_TEMPLATE: &str = "mock://tiles/{z}/{x}/{y}.tif";

/// Serves canned tile bytes by URL; unknown URLs fail like an HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    tiles: Mutex<HashMap<String, Bytes>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(coord: TileCoord) -> String {
        URL_TEMPLATE
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    pub fn insert_bytes(&self, coord: TileCoord, bytes: impl Into<Bytes>) {
        self.tiles
            .lock()
            .unwrap()
            .insert(Self::url(coord), bytes.into());
    }

    pub fn insert_grid(&self, coord: TileCoord, grid: &SampleGrid) {
        self.insert_bytes(coord, encode_geotiff_f32(grid));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TileFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> RasterResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tiles
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| RasterError::Fetch(format!("{}: HTTP 404 Not Found", url)))
    }
}

/// Point `px_from_left` pixels right of and `px_from_bottom` pixels above the
/// bottom-left corner of a 256px tile.
pub fn coordinate_in_tile(coord: TileCoord, px_from_left: f64, px_from_bottom: f64) -> Coordinate {
    let grid = WebMercatorTileGrid::default();
    let extent = grid.extent_for_tile(coord);
    let size = grid.tile_size() as f64;
    Coordinate::new(
        extent.min_x + px_from_left / size * extent.width(),
        extent.min_y + px_from_bottom / size * extent.height(),
    )
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10])
}
