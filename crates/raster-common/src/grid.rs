//! Decoded sample grids for a single raster tile.

use crate::{RasterError, RasterResult};

/// A `width × height` grid of numeric samples in row-major order.
///
/// The row/width invariant is checked on construction, so every `SampleGrid`
/// in circulation is rectangular. Zero-sized grids are representable (some
/// decoders emit them for empty tiles) and are rejected at colorization.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl SampleGrid {
    /// Build a grid from row-major samples.
    pub fn from_vec(data: Vec<f64>, width: usize, height: usize) -> RasterResult<Self> {
        if data.len() != width * height {
            return Err(RasterError::MalformedGrid(format!(
                "expected {}x{} = {} samples, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a grid from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> RasterResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);

        let mut data = Vec::with_capacity(width * height);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(RasterError::MalformedGrid(format!(
                    "row {} has {} samples, expected {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sample at `(row, col)`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// One row of samples.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        Some(&self.data[start..start + self.width])
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on 0
        self.data.chunks_exact(self.width.max(1)).take(self.height)
    }

    /// Raw row-major samples.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Approximate heap footprint, used by memory-aware cache stats.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let grid = SampleGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0, -32768.0]]).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 1), Some(2.0));
        assert_eq!(grid.get(1, 1), Some(-32768.0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = SampleGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, RasterError::MalformedGrid(_)));
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        assert!(SampleGrid::from_vec(vec![0.0; 5], 2, 3).is_err());
        assert!(SampleGrid::from_vec(vec![0.0; 6], 2, 3).is_ok());
    }

    #[test]
    fn test_rows_iterator() {
        let grid = SampleGrid::from_vec((0..6).map(f64::from).collect(), 3, 2).unwrap();
        let rows: Vec<&[f64]> = grid.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], &[3.0, 4.0, 5.0]);
        assert_eq!(grid.row(1), Some(&[3.0, 4.0, 5.0][..]));
    }

    #[test]
    fn test_empty_grid() {
        let grid = SampleGrid::from_rows(vec![]).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.rows().count(), 0);
        assert_eq!(grid.get(0, 0), None);
    }
}
