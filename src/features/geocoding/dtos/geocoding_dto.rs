use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for reverse geocoding
#[derive(Debug, Deserialize, IntoParams)]
pub struct ReverseGeocodeQuery {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

/// A place name for a coordinate
///
/// Field names follow Nominatim so existing portal code can read it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReverseGeocodeDto {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PlaceAddressDto>,
}

impl ReverseGeocodeDto {
    /// Fallback used when the upstream lookup fails
    pub fn coordinates_only(lat: f64, lon: f64) -> Self {
        Self {
            display_name: format!("{}, {}", lat, lon),
            lat,
            lon,
            address: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaceAddressDto {
    pub road: Option<String>,
    pub locality: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}
