//! Color scale configuration for raster tile layers.
//!
//! The schema mirrors the `options` object of a layer definition:
//!
//! ```json
//! {
//!   "noData": -32768,
//!   "scale": { "min": -5000, "max": 5000 },
//!   "colorScale": [["#f4ebdc", "#e9e9d5"], [0, 0.5]],
//!   "discreteLegend": false,
//!   "tileSize": 256
//! }
//! ```
//!
//! `validate` checks the structural invariants once, at layer construction.
//! Per-pixel code can then assume a well-formed scale.

use serde::{Deserialize, Serialize};

use crate::{RasterError, RasterResult};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

/// Normalization bounds for continuous color scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Colors paired with their normalized breakpoints.
///
/// Serialized as a two-element array: `[[colors...], [breakpoints...]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale(pub Vec<String>, pub Vec<f64>);

impl ColorScale {
    pub fn new(colors: Vec<String>, breakpoints: Vec<f64>) -> Self {
        Self(colors, breakpoints)
    }

    pub fn colors(&self) -> &[String] {
        &self.0
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.1
    }
}

/// Immutable color-scale settings for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleConfig {
    /// Sentinel sample meaning "no measurement".
    pub no_data: f64,

    /// Normalization domain. Required unless `discrete_legend` is set.
    #[serde(default)]
    pub scale: Option<ScaleRange>,

    pub color_scale: ColorScale,

    /// Treat samples as direct indices into the color list.
    #[serde(default)]
    pub discrete_legend: bool,

    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

impl ColorScaleConfig {
    /// Validate structural invariants.
    pub fn validate(&self) -> RasterResult<()> {
        let colors = self.color_scale.colors();
        let breakpoints = self.color_scale.breakpoints();

        if colors.is_empty() {
            return Err(invalid("color scale must have at least 1 color"));
        }

        if colors.len() != breakpoints.len() {
            return Err(invalid(format!(
                "color scale has {} colors but {} breakpoints",
                colors.len(),
                breakpoints.len()
            )));
        }

        if breakpoints.iter().any(|b| !b.is_finite()) {
            return Err(invalid("breakpoints must be finite"));
        }

        for i in 1..breakpoints.len() {
            if breakpoints[i] <= breakpoints[i - 1] {
                return Err(invalid(format!(
                    "breakpoints must be strictly ascending (index {}: {} <= {})",
                    i,
                    breakpoints[i],
                    breakpoints[i - 1]
                )));
            }
        }

        for color in colors {
            if parse_hex_color(color).is_none() {
                return Err(invalid(format!("invalid hex color '{}'", color)));
            }
        }

        if !self.discrete_legend {
            let scale = self
                .scale
                .ok_or_else(|| invalid("continuous color scale requires scale.min/scale.max"))?;
            if !scale.min.is_finite() || !scale.max.is_finite() {
                return Err(invalid(format!(
                    "scale bounds must be finite (min {}, max {})",
                    scale.min, scale.max
                )));
            }
            if !(scale.max > scale.min) {
                return Err(invalid(format!(
                    "scale.max ({}) must be greater than scale.min ({})",
                    scale.max, scale.min
                )));
            }
            if !scale.span().is_finite() {
                return Err(invalid(format!(
                    "scale span from {} to {} overflows",
                    scale.min, scale.max
                )));
            }
        }

        if self.tile_size == 0 {
            return Err(invalid("tileSize must be positive"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> RasterError {
    RasterError::ConfigValidation(message.into())
}

/// Parse `#RRGGBB` or `#RGB` (leading `#` optional) into RGB components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let s = s.trim().trim_start_matches('#');
    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            // #abc == #aabbcc
            let nibble = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).ok().map(|v| v * 17);
            Some((nibble(0)?, nibble(1)?, nibble(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_color(breaks: Vec<f64>) -> ColorScaleConfig {
        ColorScaleConfig {
            no_data: -32768.0,
            scale: Some(ScaleRange::new(-5000.0, 5000.0)),
            color_scale: ColorScale::new(vec!["#000000".into(), "#ffffff".into()], breaks),
            discrete_legend: false,
            tile_size: 256,
        }
    }

    #[test]
    fn test_parse_options_json() {
        let json = r##"{"noData":-32768,"scale":{"min":-5000,"max":5000},"colorScale":[["#f4ebdc","#e9e9d5"],[0,0.5]],"tileSize":256}"##;
        let config: ColorScaleConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.no_data, -32768.0);
        assert_eq!(config.scale, Some(ScaleRange::new(-5000.0, 5000.0)));
        assert_eq!(config.color_scale.colors().len(), 2);
        assert_eq!(config.color_scale.breakpoints(), &[0.0, 0.5]);
        assert!(!config.discrete_legend);
    }

    #[test]
    fn test_tile_size_defaults() {
        let json = r##"{"noData":0,"colorScale":[["#010203"],[0]],"discreteLegend":true}"##;
        let config: ColorScaleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
        config.validate().unwrap();
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = two_color(vec![0.0]).validate().unwrap_err();
        assert!(matches!(err, RasterError::ConfigValidation(_)));
    }

    #[test]
    fn test_non_ascending_breakpoints_rejected() {
        assert!(two_color(vec![0.5, 0.5]).validate().is_err());
        assert!(two_color(vec![0.6, 0.2]).validate().is_err());
    }

    #[test]
    fn test_inverted_scale_rejected() {
        let mut config = two_color(vec![0.0, 0.5]);
        config.scale = Some(ScaleRange::new(10.0, 10.0));
        assert!(config.validate().is_err());

        config.scale = None;
        assert!(config.validate().is_err());

        // discrete legends never normalize
        config.discrete_legend = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_finite_scale_rejected() {
        let mut config = two_color(vec![0.0, 0.5]);
        config.scale = Some(ScaleRange::new(0.0, f64::INFINITY));
        assert!(matches!(config.validate(), Err(RasterError::ConfigValidation(_))));

        config.scale = Some(ScaleRange::new(f64::NAN, 10.0));
        assert!(matches!(config.validate(), Err(RasterError::ConfigValidation(_))));

        // both bounds finite but max - min is not
        config.scale = Some(ScaleRange::new(-1e308, 1e308));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RasterError::ConfigValidation(_)));
        assert!(err.to_string().contains("overflows"));

        config.scale = Some(ScaleRange::new(-1e307, 1e307));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_hex_rejected() {
        let mut config = two_color(vec![0.0, 0.5]);
        config.color_scale.0[1] = "#zzzzzz".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#f4ebdc"), Some((0xf4, 0xeb, 0xdc)));
        assert_eq!(parse_hex_color("6c584c"), Some((0x6c, 0x58, 0x4c)));
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#+12345"), None);
    }
}
