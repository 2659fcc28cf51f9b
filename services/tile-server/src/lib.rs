//! Raster tile service library.
//!
//! Serves colorized GeoTIFF tiles and answers value-under-cursor queries
//! from the grids retained while colorizing.

pub mod config;
pub mod fetch;
pub mod handlers;
pub mod source;
pub mod state;

use axum::{extract::Extension, routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the service router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tiles/:layer/:z/:x/:y", get(handlers::tile_handler))
        .route("/value/:layer", get(handlers::value_handler))
        .route("/layers", get(handlers::layers_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
