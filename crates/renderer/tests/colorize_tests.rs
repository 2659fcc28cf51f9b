//! Tests for grid colorization.

use raster_common::{RasterError, SampleGrid};
use renderer::{ColorMapper, Rgba, TileColorizer};
use test_utils::{
    create_elevation_grid, create_grid_with_no_data, discrete_config, elevation_color_config,
    two_band_config, ELEVATION_NO_DATA,
};

fn two_band_colorizer() -> TileColorizer {
    TileColorizer::new(ColorMapper::from_config(&two_band_config("#112233", "#445566")).unwrap())
}

#[test]
fn test_buffer_layout() {
    let grid = SampleGrid::from_rows(vec![
        vec![-5000.0, 5000.0, -5000.0],
        vec![ELEVATION_NO_DATA, 0.0, -4000.0],
    ])
    .unwrap();

    let pixels = two_band_colorizer().colorize(&grid).unwrap();
    assert_eq!(pixels.width, 3);
    assert_eq!(pixels.height, 2);
    assert_eq!(pixels.data.len(), 3 * 2 * 4);

    // (row 0, col 1) at offset (0 * 3 + 1) * 4
    assert_eq!(&pixels.data[4..8], &[0x44, 0x55, 0x66, 255]);
    // (row 1, col 0) is no-data
    assert_eq!(&pixels.data[12..16], &[0, 0, 0, 0]);
    assert_eq!(pixels.pixel(1, 1), Some(Rgba::opaque(0x44, 0x55, 0x66)));
    assert_eq!(pixels.pixel(1, 2), Some(Rgba::opaque(0x11, 0x22, 0x33)));
    assert_eq!(pixels.pixel(2, 0), None);
}

#[test]
fn test_no_data_transparent_continuous() {
    let grid = create_grid_with_no_data(32, 32, ELEVATION_NO_DATA, 3);
    let colorizer = TileColorizer::new(ColorMapper::from_config(&elevation_color_config()).unwrap());
    let pixels = colorizer.colorize(&grid).unwrap();

    for row in 0..32 {
        for col in 0..32 {
            let px = pixels.pixel(row, col).unwrap();
            if grid.get(row, col) == Some(ELEVATION_NO_DATA) {
                assert_eq!(px, Rgba::transparent());
            } else {
                assert_eq!(px.a, 255);
            }
        }
    }
}

#[test]
fn test_no_data_transparent_discrete() {
    // no-data value 0 would otherwise select colors[0]
    let colorizer = TileColorizer::new(
        ColorMapper::from_config(&discrete_config(&["#ff0000", "#00ff00"], 0.0)).unwrap(),
    );
    let grid = SampleGrid::from_rows(vec![vec![0.0, 1.0]]).unwrap();
    let pixels = colorizer.colorize(&grid).unwrap();

    assert_eq!(pixels.pixel(0, 0), Some(Rgba::transparent()));
    assert_eq!(pixels.pixel(0, 1), Some(Rgba::opaque(0, 255, 0)));
}

#[test]
fn test_parallel_matches_per_pixel_mapping() {
    // 256x256 takes the parallel path
    let grid = create_elevation_grid(256, 256);
    let mapper = ColorMapper::from_config(&elevation_color_config()).unwrap();
    let pixels = TileColorizer::new(mapper.clone()).colorize(&grid).unwrap();

    for row in [0, 17, 128, 255] {
        for col in [0, 1, 100, 200, 255] {
            let sample = grid.get(row, col).unwrap();
            assert_eq!(pixels.pixel(row, col), Some(mapper.map_value(sample)));
        }
    }
}

#[test]
fn test_grid_left_intact() {
    let grid = create_elevation_grid(16, 8);
    let before = grid.clone();
    let tile = two_band_colorizer().colorize_owned(grid).unwrap();
    assert_eq!(tile.grid, before);
    assert_eq!(tile.pixels.width, 16);
    assert_eq!(tile.pixels.height, 8);
}

#[test]
fn test_empty_grid_rejected() {
    let grid = SampleGrid::from_rows(vec![]).unwrap();
    assert!(matches!(
        two_band_colorizer().colorize(&grid),
        Err(RasterError::MalformedGrid(_))
    ));

    let grid = SampleGrid::from_vec(vec![], 0, 4).unwrap();
    assert!(two_band_colorizer().colorize(&grid).is_err());
}
