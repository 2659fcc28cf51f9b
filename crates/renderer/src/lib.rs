//! Raster tile rendering.
//!
//! - Color mapping of samples against threshold or discrete color scales
//! - Grid colorization into RGBA pixel buffers
//! - PNG encoding of the finished tiles

pub mod colorize;
pub mod colormap;
pub mod png;

pub use colorize::{ColorizedTile, PixelBuffer, TileColorizer};
pub use colormap::{ColorMapper, ColorStrategy, Rgba};
