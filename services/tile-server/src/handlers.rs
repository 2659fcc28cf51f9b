//! HTTP request handlers.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::gauge;
use raster_common::{Coordinate, RasterError, TileCoord};
use renderer::png;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::state::AppState;

/// JSON error body with the status from the error's HTTP mapping.
pub fn error_response(err: &RasterError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind(),
    });
    (status, Json(body)).into_response()
}

fn png_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response()
}

/// Transparent tile served in place of one that failed to load.
fn blank_response(tile_size: u32) -> Response {
    match png::blank_tile(tile_size as usize) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /tiles/:layer/:z/:x/:y` where `y` may carry a `.png` suffix.
#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((layer, z, x, y)): Path<(String, u32, u32, String)>,
) -> Response {
    let y_str = y.strip_suffix(".png").unwrap_or(&y);
    let y: u32 = match y_str.parse() {
        Ok(v) => v,
        Err(_) => {
            return error_response(&RasterError::InvalidParameter {
                param: "y".to_string(),
                message: format!("'{}' is not a tile row", y_str),
            })
        }
    };

    let source = match state.source(&layer) {
        Ok(source) => source,
        Err(e) => return error_response(&e),
    };

    if !source.layer().accepts_zoom(z) {
        return error_response(&RasterError::InvalidParameter {
            param: "z".to_string(),
            message: format!("zoom {} exceeds the layer's maximum", z),
        });
    }

    let coord = TileCoord::new(z, x, y);
    match source.load_tile(coord).await {
        Ok(bytes) => png_response(bytes),
        Err(e @ RasterError::InvalidParameter { .. }) => error_response(&e),
        Err(_) => blank_response(source.tile_size()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValueParams {
    /// Web Mercator easting
    pub x: Option<f64>,
    /// Web Mercator northing
    pub y: Option<f64>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub zoom: f64,
}

impl ValueParams {
    fn coordinate(&self) -> Result<Coordinate, RasterError> {
        match (self.x, self.y, self.lon, self.lat) {
            (Some(x), Some(y), _, _) => Ok(Coordinate::new(x, y)),
            (_, _, Some(lon), Some(lat)) => Ok(Coordinate::from_lon_lat(lon, lat)),
            _ => Err(RasterError::InvalidParameter {
                param: "coordinate".to_string(),
                message: "provide either x and y or lon and lat".to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValueResponse {
    pub layer: String,
    pub value: f64,
    pub no_data: bool,
}

/// `GET /value/:layer?x=&y=&zoom=` (or `lon`/`lat` in place of `x`/`y`).
#[instrument(skip(state))]
pub async fn value_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(layer): Path<String>,
    Query(params): Query<ValueParams>,
) -> Response {
    let source = match state.source(&layer) {
        Ok(source) => source,
        Err(e) => return error_response(&e),
    };
    let coord = match params.coordinate() {
        Ok(coord) => coord,
        Err(e) => return error_response(&e),
    };
    if !params.zoom.is_finite() {
        return error_response(&RasterError::InvalidParameter {
            param: "zoom".to_string(),
            message: "zoom must be a finite number".to_string(),
        });
    }

    let value = source.value_at(coord, params.zoom).await;
    Json(ValueResponse {
        layer,
        value,
        no_data: value == source.no_data(),
    })
    .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: String,
    pub attributions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub tile_url: String,
    pub tile_size: u32,
    pub no_data: f64,
    pub discrete_legend: bool,
    pub max_zoom: Option<u32>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
}

/// `GET /layers`
pub async fn layers_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let layers: Vec<LayerSummary> = state
        .sources()
        .map(|source| {
            let layer = source.layer();
            let display = &layer.options.display;
            LayerSummary {
                id: layer.id.to_string(),
                attributions: layer.attributions.clone(),
                group: layer.group.clone(),
                desc: layer.desc.clone(),
                tile_url: format!("/tiles/{}/{{z}}/{{x}}/{{y}}.png", layer.id),
                tile_size: source.tile_size(),
                no_data: source.no_data(),
                discrete_legend: layer.options.color.discrete_legend,
                max_zoom: display.max_zoom,
                opacity: display.opacity,
                z_index: display.z_index,
            }
        })
        .collect();

    Json(serde_json::json!({ "layers": layers }))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    for source in state.sources() {
        let stats = source.cache().stats();
        let layer = source.id().to_string();
        gauge!("value_cache_hits_total", "layer" => layer.clone())
            .set(stats.hits.load(Ordering::Relaxed) as f64);
        gauge!("value_cache_misses_total", "layer" => layer.clone())
            .set(stats.misses.load(Ordering::Relaxed) as f64);
        gauge!("value_cache_hit_rate_percent", "layer" => layer.clone()).set(stats.hit_rate());
        gauge!("value_cache_evictions_total", "layer" => layer.clone())
            .set(stats.evictions.load(Ordering::Relaxed) as f64);
        gauge!("value_cache_entries", "layer" => layer.clone())
            .set(stats.entry_count.load(Ordering::Relaxed) as f64);
        gauge!("value_cache_size_bytes", "layer" => layer)
            .set(stats.size_bytes.load(Ordering::Relaxed) as f64);
    }

    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => {
            error!("Metrics requested but no Prometheus recorder is installed");
            (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response()
        }
    }
}
