//! Common test fixtures for raster tile tests.
//!
//! The elevation palette matches the terrain layer shipped in
//! `config/layers.yaml`.

use raster_common::{
    ColorScale, ColorScaleConfig, DisplayHints, LayerConfig, LayerId, LayerOptions, SampleGrid,
    ScaleRange,
};
use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder};

/// No-data sentinel used by the elevation tiles.
pub const ELEVATION_NO_DATA: f64 = -32768.0;

/// Twenty-step terrain palette.
pub const ELEVATION_COLORS: [&str; 20] = [
    "#f4ebdc", "#e9e9d5", "#dde6ce", "#d2e4c7", "#c8e0be", "#c0d8ab", "#b9cf97", "#b1c684",
    "#b2c473", "#bfcc68", "#ccd35c", "#d9db51", "#d6d050", "#c8b857", "#baa05e", "#ac8966",
    "#9c7b61", "#8c6f5a", "#7c6453", "#6c584c",
];

/// Breakpoints for [`ELEVATION_COLORS`], every 0.05 of the normalized domain.
pub fn elevation_breakpoints() -> Vec<f64> {
    (0..20).map(|i| i as f64 * 0.05).collect()
}

/// Terrain color scale over -5000..5000 m.
pub fn elevation_color_config() -> ColorScaleConfig {
    ColorScaleConfig {
        no_data: ELEVATION_NO_DATA,
        scale: Some(ScaleRange::new(-5000.0, 5000.0)),
        color_scale: ColorScale::new(
            ELEVATION_COLORS.iter().map(|c| c.to_string()).collect(),
            elevation_breakpoints(),
        ),
        discrete_legend: false,
        tile_size: 256,
    }
}

/// Two-band continuous scale with breakpoints `[0, 0.5]`.
pub fn two_band_config(low: &str, high: &str) -> ColorScaleConfig {
    ColorScaleConfig {
        no_data: ELEVATION_NO_DATA,
        scale: Some(ScaleRange::new(-5000.0, 5000.0)),
        color_scale: ColorScale::new(vec![low.to_string(), high.to_string()], vec![0.0, 0.5]),
        discrete_legend: false,
        tile_size: 256,
    }
}

/// Discrete legend: sample `i` selects `colors[i]`.
pub fn discrete_config(colors: &[&str], no_data: f64) -> ColorScaleConfig {
    ColorScaleConfig {
        no_data,
        scale: None,
        color_scale: ColorScale::new(
            colors.iter().map(|c| c.to_string()).collect(),
            (0..colors.len()).map(|i| i as f64).collect(),
        ),
        discrete_legend: true,
        tile_size: 256,
    }
}

/// Elevation layer pointing at `url_template`.
pub fn elevation_layer(url_template: &str) -> LayerConfig {
    LayerConfig {
        id: LayerId::new("Elevation"),
        url_template: url_template.to_string(),
        attributions: "Map tiles by AWS Elevation Tiles".to_string(),
        group: Some("Terrain Layers".to_string()),
        desc: None,
        options: LayerOptions {
            color: elevation_color_config(),
            display: DisplayHints {
                max_zoom: Some(15),
                opacity: Some(1.0),
                z_index: Some(100),
            },
        },
    }
}

/// Encode a grid as a single-band 32-bit float TIFF.
pub fn encode_geotiff_f32(grid: &SampleGrid) -> Vec<u8> {
    let data: Vec<f32> = grid.as_slice().iter().map(|&v| v as f32).collect();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).expect("tiff encoder");
        encoder
            .write_image::<colortype::Gray32Float>(
                grid.width() as u32,
                grid.height() as u32,
                &data,
            )
            .expect("tiff write");
    }
    buf.into_inner()
}

/// Encode a grid as a single-band 16-bit unsigned TIFF.
pub fn encode_geotiff_u16(grid: &SampleGrid) -> Vec<u8> {
    let data: Vec<u16> = grid.as_slice().iter().map(|&v| v as u16).collect();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).expect("tiff encoder");
        encoder
            .write_image::<colortype::Gray16>(grid.width() as u32, grid.height() as u32, &data)
            .expect("tiff write");
    }
    buf.into_inner()
}
