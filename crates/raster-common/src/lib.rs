//! Common types shared across the raster tile workspace.

pub mod error;
pub mod grid;
pub mod layer;
pub mod style;
pub mod tile;

pub use error::{RasterError, RasterResult};
pub use grid::SampleGrid;
pub use layer::{DisplayHints, LayerConfig, LayerId, LayerOptions, LayersFile};
pub use style::{ColorScale, ColorScaleConfig, ScaleRange, DEFAULT_TILE_SIZE};
pub use tile::{Coordinate, Extent, TileCoord, TileGrid, TileKey, WebMercatorTileGrid};
