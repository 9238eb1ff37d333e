use serde::Deserialize;

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};
use crate::features::geocoding::dtos::{PlaceAddressDto, ReverseGeocodeDto};

/// Nominatim reverse API response structure
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    lat: String,
    lon: String,
    display_name: String,
    address: Option<NominatimAddress>,
}

/// Nominatim address components
#[derive(Debug, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// City, falling back to town or village
    fn city(&self) -> Option<String> {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
    }

    /// Suburb, falling back to neighbourhood
    fn locality(&self) -> Option<String> {
        self.suburb
            .clone()
            .or_else(|| self.neighbourhood.clone())
    }
}

/// Reverse geocoding through Nominatim
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the place at a coordinate
    ///
    /// Any upstream failure degrades to [`ReverseGeocodeDto::coordinates_only`]
    /// so callers always get a displayable name.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeDto> {
        validate_coordinates(lat, lon)?;

        match self.lookup(lat, lon).await {
            Ok(place) => Ok(place),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for {}, {}: {}", lat, lon, e);
                Ok(ReverseGeocodeDto::coordinates_only(lat, lon))
            }
        }
    }

    async fn lookup(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeDto> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&addressdetails=1",
            self.base_url,
            urlencoding::encode(&lat.to_string()),
            urlencoding::encode(&lon.to_string())
        );

        tracing::debug!("Reverse geocoding {}, {} -> {}", lat, lon, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let body: NominatimReverse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        Ok(into_place(body, lat, lon))
    }
}

/// Latitude within ±90 and longitude within ±180
pub(crate) fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest(
            "lat must be between -90 and 90".to_string(),
        ));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::BadRequest(
            "lon must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn into_place(body: NominatimReverse, lat: f64, lon: f64) -> ReverseGeocodeDto {
    let address = body.address.map(|a| PlaceAddressDto {
        locality: a.locality(),
        city: a.city(),
        road: a.road,
        state: a.state,
        postcode: a.postcode,
        country: a.country,
    });

    ReverseGeocodeDto {
        display_name: body.display_name,
        lat: body.lat.parse().unwrap_or(lat),
        lon: body.lon.parse().unwrap_or(lon),
        address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_service() -> GeocodingService {
        GeocodingService::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "wastewise-test".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_into_place_reads_address_components() {
        let body: NominatimReverse = serde_json::from_value(serde_json::json!({
            "place_id": 1234,
            "lat": "12.9716",
            "lon": "77.5946",
            "display_name": "MG Road, Shivajinagar, Bengaluru, Karnataka, India",
            "address": {
                "road": "MG Road",
                "neighbourhood": "Shivajinagar",
                "city": "Bengaluru",
                "state": "Karnataka",
                "country": "India"
            }
        }))
        .unwrap();

        let place = into_place(body, 0.0, 0.0);
        assert_eq!(place.lat, 12.9716);
        assert_eq!(place.lon, 77.5946);
        let address = place.address.unwrap();
        assert_eq!(address.locality.as_deref(), Some("Shivajinagar"));
        assert_eq!(address.city.as_deref(), Some("Bengaluru"));
        assert_eq!(address.road.as_deref(), Some("MG Road"));
    }

    #[test]
    fn test_city_falls_back_to_town_then_village() {
        let town: NominatimAddress =
            serde_json::from_value(serde_json::json!({ "town": "Mysuru" })).unwrap();
        assert_eq!(town.city(), Some("Mysuru".to_string()));

        let village: NominatimAddress =
            serde_json::from_value(serde_json::json!({ "village": "Hosakote" })).unwrap();
        assert_eq!(village.city(), Some("Hosakote".to_string()));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(12.97, 77.59).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[tokio::test]
    async fn test_reverse_falls_back_to_coordinates_when_upstream_is_down() {
        let place = unreachable_service().reverse(12.5, 77.25).await.unwrap();
        assert_eq!(place.display_name, "12.5, 77.25");
        assert_eq!(place.lat, 12.5);
        assert_eq!(place.lon, 77.25);
        assert!(place.address.is_none());
    }

    #[tokio::test]
    async fn test_reverse_rejects_out_of_range_coordinates() {
        let result = unreachable_service().reverse(123.0, 0.0).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
