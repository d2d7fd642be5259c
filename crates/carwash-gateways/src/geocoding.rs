//! Google Geocoding API client

use async_trait::async_trait;
use carwash_core::{models::Coordinates, traits::Geocoder, AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{http_client, transport_error};

/// Geocoder backed by the Google Geocoding JSON API
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Create a geocoder for the given endpoint and API key
    pub fn new(endpoint: &str, api_key: &str) -> AppResult<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Interpret a decoded API response
    fn coordinates_from(response: GeocodeResponse, address: &str) -> AppResult<Coordinates> {
        match response.status.as_str() {
            "OK" => {
                let location = response
                    .results
                    .into_iter()
                    .next()
                    .map(|r| r.geometry.location)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("No coordinates for address: {}", address))
                    })?;
                let coordinates = Coordinates::new(location.lat, location.lng);
                coordinates.validate()?;
                Ok(coordinates)
            }
            "ZERO_RESULTS" => Err(AppError::NotFound(format!(
                "No coordinates for address: {}",
                address
            ))),
            other => {
                let detail = response.error_message.unwrap_or_default();
                warn!("Geocoding failed with status {}: {}", other, detail);
                Err(AppError::UpstreamUnavailable(format!(
                    "geocoding returned {} {}",
                    other, detail
                )))
            }
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> AppResult<Coordinates> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("geocoding", e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Geocoding HTTP error: status={}", status);
            return Err(AppError::UpstreamUnavailable(format!(
                "geocoding returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("unreadable geocoding response: {}", e))
        })?;

        let coordinates = Self::coordinates_from(body, address)?;
        debug!(
            "Geocoded to {}, {}",
            coordinates.latitude, coordinates.longitude
        );
        Ok(coordinates)
    }
}

/// Stand-in used when no API key is configured
pub struct UnconfiguredGeocoder;

#[async_trait]
impl Geocoder for UnconfiguredGeocoder {
    async fn geocode(&self, _address: &str) -> AppResult<Coordinates> {
        Err(AppError::UpstreamUnavailable(
            "geocoding is not configured".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppResult<Coordinates> {
        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        GoogleGeocoder::coordinates_from(response, "12 Main Road, Danoon")
    }

    #[test]
    fn test_ok_response() {
        let coordinates = parse(
            r#"{"status":"OK","results":[
                {"geometry":{"location":{"lat":-26.54,"lng":31.1}}},
                {"geometry":{"location":{"lat":0.0,"lng":0.0}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(coordinates.latitude, -26.54);
        assert_eq!(coordinates.longitude, 31.1);
    }

    #[test]
    fn test_zero_results() {
        assert!(matches!(
            parse(r#"{"status":"ZERO_RESULTS","results":[]}"#),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            parse(r#"{"status":"OK","results":[]}"#),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_provider_errors() {
        assert!(matches!(
            parse(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#),
            Err(AppError::UpstreamUnavailable(_))
        ));
        assert!(matches!(
            parse(r#"{"status":"OK","results":[{"geometry":{"location":{"lat":91.0,"lng":0.0}}}]}"#),
            Err(AppError::InvalidInput(_))
        ));
    }
}
