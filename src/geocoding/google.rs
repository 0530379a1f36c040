//! Google Maps Geocoding API client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{GeocodeError, Geocoder};
use crate::models::GeocodeResult;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const GEOCODE_PATH: &str = "/maps/api/geocode/json";
const USER_AGENT: &str = "citybound/0.1 (municipal boundary check)";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

/// Geocodes addresses with the Google Maps Geocoding API
pub struct GoogleGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join(GEOCODE_PATH)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    fn request_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let response = self.client.get(self.request_url(address)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: format!("HTTP {}", status.as_u16()),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let data: GoogleResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Decode(e.to_string()))?;

        let result = parse_response(data)?;
        debug!(
            "Geocoded '{}' to ({}, {})",
            address, result.lat, result.lng
        );
        Ok(result)
    }
}

/// Map the provider's status to a result: `OK` takes the first result
fn parse_response(data: GoogleResponse) -> Result<GeocodeResult, GeocodeError> {
    match data.status.as_str() {
        "OK" => {
            let first = data
                .results
                .into_iter()
                .next()
                .ok_or(GeocodeError::NoResults)?;
            Ok(GeocodeResult {
                lat: first.geometry.location.lat,
                lng: first.geometry.location.lng,
                place_id: first.place_id,
                formatted_address: first.formatted_address,
            })
        }
        "ZERO_RESULTS" => Err(GeocodeError::NoResults),
        _ => Err(GeocodeError::Status {
            status: data.status,
            message: data.error_message.unwrap_or_default(),
        }),
    }
}
