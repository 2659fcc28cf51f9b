//! HTTP routes exercised through the router without a listener.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{coordinate_in_tile, is_png, MockFetcher, URL_TEMPLATE};
use geotiff_parser::GeoTiffDecoder;
use raster_common::{LayersFile, TileCoord};
use std::sync::Arc;
use test_utils::{create_test_grid, elevation_layer, ELEVATION_NO_DATA};
use tile_server::handlers::ValueResponse;
use tile_server::source::SourceOptions;
use tile_server::state::AppState;
use tower::ServiceExt;

const LOADED: TileCoord = TileCoord { z: 2, x: 1, y: 2 };

fn app() -> Router {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert_grid(LOADED, &create_test_grid(256, 256));

    let layers = LayersFile {
        layers: vec![elevation_layer(URL_TEMPLATE)],
    };
    let state = AppState::from_layers(
        layers,
        SourceOptions::default(),
        fetcher,
        Arc::new(GeoTiffDecoder::new()),
    )
    .unwrap();

    tile_server::router(Arc::new(state))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(&app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_layers_listing() {
    let (status, _, body) = get(&app(), "/layers").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let layer = &json["layers"][0];
    assert_eq!(layer["id"], "Elevation");
    assert_eq!(layer["maxZoom"], 15);
    assert_eq!(layer["zIndex"], 100);
    assert_eq!(layer["noData"], -32768.0);
    assert_eq!(layer["tileUrl"], "/tiles/Elevation/{z}/{x}/{y}.png");
}

#[tokio::test]
async fn test_tile_served_as_png() {
    let (status, content_type, body) = get(&app(), "/tiles/Elevation/2/1/2.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(is_png(&body));
}

#[tokio::test]
async fn test_failed_tile_is_blank() {
    // the mock fetcher has no bytes for this tile
    let (status, content_type, body) = get(&app(), "/tiles/Elevation/1/0/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(is_png(&body));
}

#[tokio::test]
async fn test_zoom_above_max_rejected() {
    let (status, _, body) = get(&app(), "/tiles/Elevation/16/0/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kind"], "invalid_parameter");
}

#[tokio::test]
async fn test_bad_tile_row_rejected() {
    let (status, _, _) = get(&app(), "/tiles/Elevation/2/1/two.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_layer() {
    let (status, _, _) = get(&app(), "/tiles/Bathymetry/1/0/0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&app(), "/value/Bathymetry?x=0&y=0&zoom=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_value_after_tile_load() {
    let app = app();
    let coord = coordinate_in_tile(LOADED, 100.5, 50.5);
    let uri = format!("/value/Elevation?x={}&y={}&zoom=2", coord.x, coord.y);

    // nothing loaded yet
    let (status, _, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let value: ValueResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(value.value, ELEVATION_NO_DATA);
    assert!(value.no_data);

    let (status, _, _) = get(&app, "/tiles/Elevation/2/1/2.png").await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = get(&app, &uri).await;
    let value: ValueResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(value.layer, "Elevation");
    assert_eq!(value.value, 100_206.0);
    assert!(!value.no_data);
}

#[tokio::test]
async fn test_value_requires_coordinate() {
    let (status, _, _) = get(&app(), "/value/Elevation?zoom=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = get(&app(), "/value/Elevation?x=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_value_by_lon_lat() {
    let (status, _, body) = get(&app(), "/value/Elevation?lon=-122.42&lat=37.77&zoom=4").await;
    assert_eq!(status, StatusCode::OK);
    let value: ValueResponse = serde_json::from_slice(&body).unwrap();
    assert!(value.no_data);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (status, _, _) = get(&app(), "/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_shipped_layers_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/layers.yaml");
    let layers = LayersFile::from_file(path).unwrap();
    assert_eq!(layers.layers.len(), 1);

    let state = AppState::from_layers(
        layers,
        SourceOptions::default(),
        Arc::new(MockFetcher::new()),
        Arc::new(GeoTiffDecoder::new()),
    )
    .unwrap();
    let source = state.source("Elevation").unwrap();
    assert_eq!(source.layer().options.color.color_scale.colors().len(), 20);
    assert_eq!(source.tile_size(), 256);
}

#[test]
fn test_duplicate_layers_rejected() {
    let layers = LayersFile {
        layers: vec![elevation_layer(URL_TEMPLATE), elevation_layer(URL_TEMPLATE)],
    };
    let result = AppState::from_layers(
        layers,
        SourceOptions::default(),
        Arc::new(MockFetcher::new()),
        Arc::new(GeoTiffDecoder::new()),
    );
    assert!(result.is_err());
}
