//! Error types for raster tile services.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for tile loading and layer setup.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Tile Load Errors ===
    #[error("Tile fetch failed: {0}")]
    Fetch(String),

    #[error("Raster decode failed: {0}")]
    Decode(String),

    #[error("Malformed grid: {0}")]
    MalformedGrid(String),

    // === Configuration Errors ===
    #[error("Invalid color scale configuration: {0}")]
    ConfigValidation(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Infrastructure Errors ===
    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RasterError {
    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RasterError::Fetch(_) => "fetch",
            RasterError::Decode(_) => "decode",
            RasterError::MalformedGrid(_) => "malformed_grid",
            RasterError::ConfigValidation(_) => "config_validation",
            RasterError::LayerNotFound(_) => "layer_not_found",
            RasterError::InvalidParameter { .. } => "invalid_parameter",
            RasterError::Io(_) => "io",
            RasterError::Internal(_) => "internal",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RasterError::InvalidParameter { .. } => 400,
            RasterError::LayerNotFound(_) => 404,
            RasterError::Fetch(_) => 502,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        RasterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::ConfigValidation(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for RasterError {
    fn from(err: serde_yaml::Error) -> Self {
        RasterError::ConfigValidation(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RasterError::LayerNotFound("x".into()).http_status_code(), 404);
        assert_eq!(RasterError::Fetch("timeout".into()).http_status_code(), 502);
        assert_eq!(RasterError::Decode("bad".into()).http_status_code(), 500);
        assert_eq!(
            RasterError::InvalidParameter {
                param: "zoom".into(),
                message: "too deep".into()
            }
            .http_status_code(),
            400
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(RasterError::MalformedGrid("ragged".into()).kind(), "malformed_grid");
        assert_eq!(RasterError::ConfigValidation("x".into()).kind(), "config_validation");
    }
}
