//! Sample grid generators for tests.
//!
//! These generators create predictable, verifiable grids so assertions can
//! compute the expected sample at any cell.

use raster_common::SampleGrid;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.get(0, 0), Some(0.0));
/// assert_eq!(grid.get(0, 1), Some(1000.0)); // row=0, col=1
/// assert_eq!(grid.get(1, 0), Some(1.0));    // row=1, col=0
/// ```
pub fn create_test_grid(width: usize, height: usize) -> SampleGrid {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    grid(data, width, height)
}

/// Creates an elevation-like ramp from `-5000` m (left) to `5000` m (right).
pub fn create_elevation_grid(width: usize, height: usize) -> SampleGrid {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let t = col as f64 / (width.max(2) - 1) as f64;
            data.push((-5000.0 + t * 10000.0).round());
        }
    }
    grid(data, width, height)
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> SampleGrid {
    grid(vec![value; width * height], width, height)
}

/// Creates a test grid where every `interval`-th cell holds `no_data`.
pub fn create_grid_with_no_data(
    width: usize,
    height: usize,
    no_data: f64,
    interval: usize,
) -> SampleGrid {
    let data = (0..width * height)
        .map(|i| {
            if interval > 0 && i % interval == 0 {
                no_data
            } else {
                (i % 100) as f64
            }
        })
        .collect();
    grid(data, width, height)
}

fn grid(data: Vec<f64>, width: usize, height: usize) -> SampleGrid {
    SampleGrid::from_vec(data, width, height).expect("generator produced a rectangular grid")
}
