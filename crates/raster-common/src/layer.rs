//! Layer definitions for raster tile sources.
//!
//! A layer file lists one entry per tile source:
//!
//! ```yaml
//! layers:
//!   - id: Elevation
//!     urlTemplate: "https://s3.amazonaws.com/elevation-tiles-prod/v2/geotiff/{z}/{x}/{y}.tif"
//!     attributions: "AWS Elevation Tiles"
//!     options:
//!       noData: -32768
//!       scale: { min: -5000, max: 5000 }
//!       colorScale: [["#f4ebdc", "#6c584c"], [0, 0.5]]
//!       maxZoom: 15
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::{ColorScaleConfig, RasterError, RasterResult, TileCoord};

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation hints handed to the map client untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHints {
    #[serde(default)]
    pub max_zoom: Option<u32>,

    #[serde(default)]
    pub opacity: Option<f64>,

    #[serde(default)]
    pub z_index: Option<i32>,
}

/// The `options` object of a layer: color scale plus display hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerOptions {
    #[serde(flatten)]
    pub color: ColorScaleConfig,

    #[serde(flatten)]
    pub display: DisplayHints,
}

/// A single raster tile layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: LayerId,

    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,

    #[serde(default)]
    pub attributions: String,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub desc: Option<String>,

    pub options: LayerOptions,
}

impl LayerConfig {
    pub fn validate(&self) -> RasterResult<()> {
        if self.url_template.trim().is_empty() {
            return Err(RasterError::ConfigValidation(format!(
                "{}: urlTemplate is empty",
                self.id
            )));
        }
        self.options.color.validate().map_err(|e| match e {
            RasterError::ConfigValidation(msg) => {
                RasterError::ConfigValidation(format!("{}: {}", self.id, msg))
            }
            other => other,
        })
    }

    /// Expand the URL template for one tile.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    /// Whether the layer serves tiles at this zoom.
    pub fn accepts_zoom(&self, z: u32) -> bool {
        self.options.display.max_zoom.map_or(true, |max| z <= max)
    }
}

/// Root of a layer configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayersFile {
    pub layers: Vec<LayerConfig>,
}

impl LayersFile {
    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_json(content: &str) -> RasterResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> RasterResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate every layer and reject duplicate ids.
    pub fn validate(&self) -> RasterResult<()> {
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(RasterError::ConfigValidation(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            layer.validate()?;
        }
        Ok(())
    }
}
