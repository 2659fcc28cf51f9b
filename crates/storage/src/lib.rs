//! In-memory storage for raster tile services.
//!
//! Holds the decoded sample grids behind every served tile so map
//! coordinates can be resolved back to raw values.

pub mod tile_value_cache;

pub use tile_value_cache::{
    pixel_for_coordinate, EvictionPolicy, TileValueCache, TileValueCacheStats,
};
