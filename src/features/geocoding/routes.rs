use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::geocoding::handlers;
use crate::features::geocoding::services::GeocodingService;

/// Public geocoding routes
pub fn routes(service: Arc<GeocodingService>) -> Router {
    Router::new()
        .route("/api/geocode/reverse", get(handlers::reverse_geocode))
        .with_state(service)
}
