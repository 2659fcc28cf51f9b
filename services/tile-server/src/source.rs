//! Per-layer raster tile source.
//!
//! `GeoRasterSource` owns everything one layer needs: the compiled color
//! scale, the retained grids for value queries, and the fetch/decode
//! collaborators. A tile load runs fetch → decode → colorize → store →
//! encode. Loads for different tiles are independent and may finish in any
//! order; the value cache is the only state they share.

use geotiff_parser::RasterDecoder;
use metrics::{counter, histogram};
use raster_common::{
    Coordinate, LayerConfig, LayerId, RasterError, RasterResult, SampleGrid, TileCoord, TileGrid,
    WebMercatorTileGrid,
};
use renderer::{png, ColorMapper, PixelBuffer, TileColorizer};
use std::sync::Arc;
use std::time::Instant;
use storage::{EvictionPolicy, TileValueCache};
use tracing::{debug, info, warn};

use crate::fetch::TileFetcher;

/// Cache settings applied to every source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOptions {
    pub eviction: EvictionPolicy,
    pub key_includes_zoom: bool,
}

pub struct GeoRasterSource {
    layer: LayerConfig,
    colorizer: Arc<TileColorizer>,
    cache: TileValueCache,
    fetcher: Arc<dyn TileFetcher>,
    decoder: Arc<dyn RasterDecoder>,
    tile_grid: Arc<dyn TileGrid>,
}

impl GeoRasterSource {
    /// Build a source for `layer`.
    ///
    /// Fails with `ConfigValidation` if the layer's color scale is invalid,
    /// so a broken layer never serves a tile.
    pub fn new(
        layer: LayerConfig,
        options: SourceOptions,
        fetcher: Arc<dyn TileFetcher>,
        decoder: Arc<dyn RasterDecoder>,
    ) -> RasterResult<Self> {
        layer.validate()?;
        let color = &layer.options.color;
        let mapper = ColorMapper::from_config(color)?;

        let cache = TileValueCache::new(color.no_data, options.eviction)
            .with_zoom_in_key(options.key_includes_zoom);
        let tile_grid: Arc<dyn TileGrid> = Arc::new(WebMercatorTileGrid::new(color.tile_size));

        info!(
            layer = %layer.id,
            colors = mapper.palette().len(),
            discrete = color.discrete_legend,
            eviction = ?options.eviction,
            "Layer source ready"
        );

        Ok(Self {
            layer,
            colorizer: Arc::new(TileColorizer::new(mapper)),
            cache,
            fetcher,
            decoder,
            tile_grid,
        })
    }

    pub fn id(&self) -> &LayerId {
        &self.layer.id
    }

    pub fn layer(&self) -> &LayerConfig {
        &self.layer
    }

    pub fn cache(&self) -> &TileValueCache {
        &self.cache
    }

    pub fn no_data(&self) -> f64 {
        self.layer.options.color.no_data
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_grid.tile_size()
    }

    /// Fetch, decode and colorize one tile, returning it as PNG.
    ///
    /// The decoded grid is retained for value queries once colorizing
    /// succeeds. Any error leaves the cache untouched for this tile.
    pub async fn load_tile(&self, coord: TileCoord) -> RasterResult<Vec<u8>> {
        let result = self.load_tile_inner(coord).await;

        match &result {
            Ok(png) => {
                counter!("tiles_loaded_total", "layer" => self.layer.id.to_string()).increment(1);
                debug!(layer = %self.layer.id, tile = %coord, bytes = png.len(), "Tile loaded");
            }
            Err(e) => {
                counter!(
                    "tile_load_failures_total",
                    "layer" => self.layer.id.to_string(),
                    "kind" => e.kind()
                )
                .increment(1);
                warn!(
                    layer = %self.layer.id,
                    tile = %coord,
                    kind = e.kind(),
                    error = %e,
                    "Tile load failed"
                );
            }
        }

        result
    }

    async fn load_tile_inner(&self, coord: TileCoord) -> RasterResult<Vec<u8>> {
        if !coord.is_valid() {
            return Err(RasterError::InvalidParameter {
                param: "tile".to_string(),
                message: format!("{} is outside the tile grid", coord),
            });
        }

        let url = self.layer.tile_url(coord);
        let bytes = self.fetcher.fetch(&url).await?;

        let decoder = self.decoder.clone();
        let grid = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| RasterError::Internal(format!("decode task failed: {}", e)))??;

        let pixels = self.ingest_grid(coord, grid).await?;
        png::encode_tile(&pixels)
    }

    /// Colorize a decoded grid and retain it under the tile's key.
    pub async fn ingest_grid(&self, coord: TileCoord, grid: SampleGrid) -> RasterResult<PixelBuffer> {
        let colorizer = self.colorizer.clone();
        let start = Instant::now();

        let tile = tokio::task::spawn_blocking(move || colorizer.colorize_owned(grid))
            .await
            .map_err(|e| RasterError::Internal(format!("colorize task failed: {}", e)))??;

        histogram!("colorize_duration_seconds", "layer" => self.layer.id.to_string())
            .record(start.elapsed().as_secs_f64());

        self.cache.store(self.cache.key_for(coord), tile.grid).await;
        Ok(tile.pixels)
    }

    /// Sample under `coord` at a map zoom, or the layer's no-data value.
    pub async fn value_at(&self, coord: Coordinate, zoom: f64) -> f64 {
        counter!("value_queries_total", "layer" => self.layer.id.to_string()).increment(1);
        self.cache
            .resolve_coordinate(coord, zoom, self.tile_grid.as_ref())
            .await
    }
}
