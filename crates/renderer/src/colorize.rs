//! Turn a decoded sample grid into an RGBA pixel buffer.

use raster_common::{RasterError, RasterResult, SampleGrid};
use rayon::prelude::*;
use tracing::trace;

use crate::colormap::{ColorMapper, Rgba};

/// Minimum cells before rows are colorized in parallel
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// RGBA pixels, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn transparent(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 4],
        }
    }

    /// Pixel at `(row, col)`.
    pub fn pixel(&self, row: usize, col: usize) -> Option<Rgba> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let idx = (row * self.width + col) * 4;
        Some(Rgba::new(
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ))
    }
}

/// A colorized tile together with the grid it was drawn from.
#[derive(Debug, Clone)]
pub struct ColorizedTile {
    pub pixels: PixelBuffer,
    pub grid: SampleGrid,
}

/// Colorizes sample grids with a fixed color scale.
#[derive(Debug, Clone)]
pub struct TileColorizer {
    mapper: ColorMapper,
}

impl TileColorizer {
    pub fn new(mapper: ColorMapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &ColorMapper {
        &self.mapper
    }

    /// Colorize every cell of `grid`.
    ///
    /// No-data cells stay fully transparent. The grid is only borrowed so the
    /// caller can retain it for value lookups afterwards.
    pub fn colorize(&self, grid: &SampleGrid) -> RasterResult<PixelBuffer> {
        if grid.is_empty() {
            return Err(RasterError::MalformedGrid(format!(
                "cannot colorize a {}x{} grid",
                grid.width(),
                grid.height()
            )));
        }

        let width = grid.width();
        let mut buffer = PixelBuffer::transparent(width, grid.height());
        let row_bytes = width * 4;

        let paint_row = |(row, out): (usize, &mut [u8])| {
            if let Some(samples) = grid.row(row) {
                for (col, &sample) in samples.iter().enumerate() {
                    if self.mapper.is_no_data(sample) {
                        continue;
                    }
                    let offset = col * 4;
                    out[offset..offset + 4]
                        .copy_from_slice(&self.mapper.map_value(sample).to_array());
                }
            }
        };

        if width * grid.height() >= PARALLEL_THRESHOLD {
            buffer
                .data
                .par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(paint_row);
        } else {
            buffer
                .data
                .chunks_mut(row_bytes)
                .enumerate()
                .for_each(paint_row);
        }

        trace!(width = width, height = grid.height(), "Colorized grid");
        Ok(buffer)
    }

    /// Colorize and hand the grid back alongside the pixels.
    pub fn colorize_owned(&self, grid: SampleGrid) -> RasterResult<ColorizedTile> {
        let pixels = self.colorize(&grid)?;
        Ok(ColorizedTile { pixels, grid })
    }
}
