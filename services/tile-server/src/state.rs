//! Application state and shared resources.

use anyhow::{Context, Result};
use geotiff_parser::{GeoTiffDecoder, RasterDecoder};
use metrics_exporter_prometheus::PrometheusHandle;
use raster_common::{LayerId, LayersFile, RasterError, RasterResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::Args;
use crate::fetch::{HttpFetcher, TileFetcher};
use crate::source::{GeoRasterSource, SourceOptions};

/// Shared application state.
pub struct AppState {
    sources: HashMap<LayerId, Arc<GeoRasterSource>>,
    /// Layer ids in configuration order
    order: Vec<LayerId>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Load the layers file and build a source per layer.
    pub fn new(args: &Args) -> Result<Self> {
        let layers = LayersFile::from_file(&args.layers_file).with_context(|| {
            format!("Failed to load layers from {}", args.layers_file.display())
        })?;

        let fetcher: Arc<dyn TileFetcher> = Arc::new(HttpFetcher::new(args.fetch_timeout())?);
        let decoder: Arc<dyn RasterDecoder> =
            Arc::new(GeoTiffDecoder::new().with_max_dimension(args.max_tile_dimension));

        let state = Self::from_layers(layers, args.source_options(), fetcher, decoder)?;
        info!(
            layers = state.order.len(),
            file = %args.layers_file.display(),
            "Layers loaded"
        );
        Ok(state)
    }

    /// Build sources from parsed layer definitions.
    ///
    /// Any invalid layer fails the whole set.
    pub fn from_layers(
        layers: LayersFile,
        options: SourceOptions,
        fetcher: Arc<dyn TileFetcher>,
        decoder: Arc<dyn RasterDecoder>,
    ) -> RasterResult<Self> {
        layers.validate()?;

        let mut sources = HashMap::with_capacity(layers.layers.len());
        let mut order = Vec::with_capacity(layers.layers.len());

        for layer in layers.layers {
            let id = layer.id.clone();
            let source = GeoRasterSource::new(layer, options, fetcher.clone(), decoder.clone())?;
            sources.insert(id.clone(), Arc::new(source));
            order.push(id);
        }

        Ok(Self {
            sources,
            order,
            prometheus: None,
        })
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn source(&self, id: &str) -> RasterResult<Arc<GeoRasterSource>> {
        self.sources
            .get(&LayerId::new(id))
            .cloned()
            .ok_or_else(|| RasterError::LayerNotFound(id.to_string()))
    }

    /// Sources in configuration order.
    pub fn sources(&self) -> impl Iterator<Item = &Arc<GeoRasterSource>> {
        self.order.iter().filter_map(|id| self.sources.get(id))
    }
}
