//! Sample-to-color mapping for raster tiles.
//!
//! A `ColorMapper` is compiled once from a validated [`ColorScaleConfig`] and
//! then used for every pixel of every tile in the layer. The two modes are a
//! closed set of strategies chosen at compile time, so the per-pixel path
//! never re-inspects the configuration.

use raster_common::style::parse_hex_color;
use raster_common::{ColorScaleConfig, RasterError, RasterResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#RRGGBB` into an opaque color.
    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_hex_color(hex).map(|(r, g, b)| Self::opaque(r, g, b))
    }
}

/// How samples select a palette entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorStrategy {
    /// Samples are palette indices.
    Discrete,
    /// Samples are normalized into `[0, 1]` and classified against ascending breakpoints.
    ContinuousThreshold {
        min: f64,
        span: f64,
        breakpoints: Vec<f64>,
    },
}

/// Compiled color scale for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapper {
    colors: Vec<Rgba>,
    strategy: ColorStrategy,
    no_data: f64,
}

impl ColorMapper {
    /// Validate `config` and precompute the palette and strategy.
    pub fn from_config(config: &ColorScaleConfig) -> RasterResult<Self> {
        config.validate()?;

        let colors = config
            .color_scale
            .colors()
            .iter()
            .map(|hex| {
                Rgba::from_hex(hex).ok_or_else(|| {
                    RasterError::ConfigValidation(format!("invalid hex color '{}'", hex))
                })
            })
            .collect::<RasterResult<Vec<_>>>()?;

        let strategy = if config.discrete_legend {
            ColorStrategy::Discrete
        } else {
            // validate() guarantees a scale with max > min in continuous mode
            let scale = config.scale.ok_or_else(|| {
                RasterError::ConfigValidation("continuous mode requires a scale".to_string())
            })?;
            ColorStrategy::ContinuousThreshold {
                min: scale.min,
                span: scale.span(),
                breakpoints: config.color_scale.breakpoints().to_vec(),
            }
        };

        Ok(Self {
            colors,
            strategy,
            no_data: config.no_data,
        })
    }

    pub fn strategy(&self) -> &ColorStrategy {
        &self.strategy
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn no_data(&self) -> f64 {
        self.no_data
    }

    /// Whether `sample` is the no-data sentinel.
    #[inline]
    pub fn is_no_data(&self, sample: f64) -> bool {
        sample == self.no_data
    }

    /// Palette index for `sample`.
    ///
    /// Discrete indices outside the palette are clamped to the nearest
    /// entry; negative and NaN samples select entry 0.
    #[inline]
    pub fn color_index(&self, sample: f64) -> usize {
        let last = self.colors.len() - 1;
        match &self.strategy {
            ColorStrategy::Discrete => {
                if sample.is_nan() || sample <= 0.0 {
                    0
                } else {
                    // saturating float->int cast, then clamp into the palette
                    (sample as usize).min(last)
                }
            }
            ColorStrategy::ContinuousThreshold {
                min,
                span,
                breakpoints,
            } => {
                let normalized = ((sample - min) / span).clamp(0.0, 1.0);
                threshold_index(breakpoints, normalized)
            }
        }
    }

    /// Map a sample to an opaque color.
    ///
    /// Callers skip no-data samples; see [`ColorMapper::is_no_data`].
    #[inline]
    pub fn map_value(&self, sample: f64) -> Rgba {
        self.colors[self.color_index(sample)]
    }
}

/// Largest `i` with `breakpoints[i] <= normalized`, or 0 when none match.
///
/// Right-biased binary search: on equality the search keeps moving up, so
/// a value sitting exactly on a breakpoint takes the higher band.
#[inline]
fn threshold_index(breakpoints: &[f64], normalized: f64) -> usize {
    let mut index = 0;
    let mut low = 0usize;
    let mut high = breakpoints.len();

    while low < high {
        let mid = low + (high - low) / 2;
        if normalized >= breakpoints[mid] {
            index = mid;
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_index() {
        let breaks = [0.0, 0.25, 0.5, 0.75];
        assert_eq!(threshold_index(&breaks, 0.0), 0);
        assert_eq!(threshold_index(&breaks, 0.1), 0);
        assert_eq!(threshold_index(&breaks, 0.25), 1);
        assert_eq!(threshold_index(&breaks, 0.74), 2);
        assert_eq!(threshold_index(&breaks, 1.0), 3);
    }

    #[test]
    fn test_threshold_below_first_breakpoint() {
        let breaks = [0.2, 0.6];
        assert_eq!(threshold_index(&breaks, 0.0), 0);
        assert_eq!(threshold_index(&breaks, f64::NAN), 0);
    }

    #[test]
    fn test_rgba_from_hex() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::new(255, 128, 0, 255)));
        assert_eq!(Rgba::from_hex("nope"), None);
        assert_eq!(Rgba::transparent().to_array(), [0, 0, 0, 0]);
    }
}
