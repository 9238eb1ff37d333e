use std::sync::Arc;

use axum::{
    extract::State,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::geocoding::dtos::{ReverseGeocodeDto, ReverseGeocodeQuery};
use crate::features::geocoding::services::GeocodingService;

/// Reverse geocode a coordinate
///
/// Never fails upstream: when the lookup service is unavailable the
/// coordinates themselves are returned as `display_name`.
#[utoipa::path(
    get,
    path = "/api/geocode/reverse",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Place for the coordinate", body = ReverseGeocodeDto),
        (status = 400, description = "Coordinates out of range")
    ),
    tag = "geocoding"
)]
pub async fn reverse_geocode(
    State(service): State<Arc<GeocodingService>>,
    AppQuery(query): AppQuery<ReverseGeocodeQuery>,
) -> Result<Json<ReverseGeocodeDto>> {
    let place = service.reverse(query.lat, query.lon).await?;
    Ok(Json(place))
}
