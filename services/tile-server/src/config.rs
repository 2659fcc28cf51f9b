//! Command line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use storage::EvictionPolicy;

use crate::source::SourceOptions;

#[derive(Parser, Debug, Clone)]
#[command(name = "tile-server")]
#[command(about = "GeoTIFF raster tile server with value-under-cursor queries")]
pub struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Layer definitions (YAML, or JSON with a .json extension)
    #[arg(long, env = "LAYERS_FILE", default_value = "config/layers.yaml")]
    pub layers_file: PathBuf,

    /// Retained grids per layer (0 = unbounded)
    #[arg(long, env = "CACHE_MAX_TILES", default_value = "0")]
    pub cache_max_tiles: usize,

    /// Retained sample bytes per layer; overrides --cache-max-tiles
    #[arg(long, env = "CACHE_MAX_BYTES")]
    pub cache_max_bytes: Option<u64>,

    /// Include the zoom level in value cache keys
    #[arg(long, env = "KEY_INCLUDES_ZOOM", default_value_t = false)]
    pub key_includes_zoom: bool,

    /// Upstream tile fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// Largest accepted tile edge in pixels
    #[arg(long, env = "MAX_TILE_DIMENSION", default_value = "4096")]
    pub max_tile_dimension: u32,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    pub worker_threads: Option<usize>,
}

impl Args {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        match self.cache_max_bytes {
            Some(bytes) if bytes > 0 => EvictionPolicy::MaxBytes(bytes),
            _ => EvictionPolicy::max_tiles(self.cache_max_tiles),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            eviction: self.eviction_policy(),
            key_includes_zoom: self.key_includes_zoom,
        }
    }
}
