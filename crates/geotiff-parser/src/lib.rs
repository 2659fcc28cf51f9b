//! GeoTIFF decoding for raster tiles.
//!
//! Tiles arrive as single-image TIFF files. Only the first band is read; its
//! samples are widened to `f64` so every layer shares one grid type no matter
//! the source pixel format.

use raster_common::{RasterError, RasterResult, SampleGrid};
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

/// Decodes fetched tile bytes into a sample grid.
pub trait RasterDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> RasterResult<SampleGrid>;
}

/// `RasterDecoder` backed by the `tiff` crate.
#[derive(Debug, Clone, Default)]
pub struct GeoTiffDecoder {
    max_dimension: Option<u32>,
}

impl GeoTiffDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject images wider or taller than `max` pixels.
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = Some(max);
        self
    }
}

impl RasterDecoder for GeoTiffDecoder {
    fn decode(&self, bytes: &[u8]) -> RasterResult<SampleGrid> {
        let mut decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| RasterError::Decode(format!("TIFF decode error: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| RasterError::Decode(format!("Cannot read dimensions: {}", e)))?;

        if width == 0 || height == 0 {
            return Err(RasterError::Decode(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }
        if let Some(max) = self.max_dimension {
            if width > max || height > max {
                return Err(RasterError::Decode(format!(
                    "image {}x{} exceeds the {} pixel limit",
                    width, height, max
                )));
            }
        }

        let result = decoder
            .read_image()
            .map_err(|e| RasterError::Decode(format!("Cannot read image data: {}", e)))?;

        let samples = widen(result)?;
        let cells = width as usize * height as usize;
        let grid = SampleGrid::from_vec(
            first_band(samples, cells)?,
            width as usize,
            height as usize,
        )?;

        debug!(width = width, height = height, "Decoded GeoTIFF tile");
        Ok(grid)
    }
}

fn widen(result: DecodingResult) -> RasterResult<Vec<f64>> {
    let data = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(RasterError::Decode(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };
    Ok(data)
}

/// Keep the first sample of each pixel from interleaved multi-band data.
fn first_band(samples: Vec<f64>, cells: usize) -> RasterResult<Vec<f64>> {
    if samples.len() == cells {
        return Ok(samples);
    }
    if samples.len() < cells || samples.len() % cells != 0 {
        return Err(RasterError::Decode(format!(
            "{} samples do not fill {} pixels",
            samples.len(),
            cells
        )));
    }
    let bands = samples.len() / cells;
    Ok(samples.into_iter().step_by(bands).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_band_single() {
        let data = vec![1.0, 2.0, 3.0];
        assert_eq!(first_band(data.clone(), 3).unwrap(), data);
    }

    #[test]
    fn test_first_band_interleaved() {
        // two pixels, three bands each
        let data = vec![1.0, 10.0, 100.0, 2.0, 20.0, 200.0];
        assert_eq!(first_band(data, 2).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_first_band_short() {
        assert!(matches!(
            first_band(vec![1.0, 2.0, 3.0], 2),
            Err(RasterError::Decode(_))
        ));
    }

    #[test]
    fn test_widen_signed() {
        let data = widen(DecodingResult::I16(vec![-32768, 0, 7])).unwrap();
        assert_eq!(data, vec![-32768.0, 0.0, 7.0]);
    }
}
