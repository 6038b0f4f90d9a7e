use crate::constants::PROVIDER_ERROR_SNIPPET_BYTES;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, Poi, PoiSource};
use crate::providers::{snippet, PoiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PLACES_NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Commercial fallback provider. Only consulted when OSM and the knowledge
/// graph both come back empty; not constructed at all without an API key.
#[derive(Clone)]
pub struct PlacesProvider {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PlacesProvider {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(PLACES_NEARBY_URL.to_string(), api_key, timeout)
    }

    pub fn with_base_url(base_url: String, api_key: String, timeout: Duration) -> Self {
        PlacesProvider {
            client: Client::new(),
            base_url,
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl PoiProvider for PlacesProvider {
    fn name(&self) -> &'static str {
        "places"
    }

    async fn fetch(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        lang: &str,
    ) -> Result<Vec<Poi>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("location", format!("{},{}", center.lat, center.lng)),
                ("radius", format!("{}", radius_meters as i64)),
                ("language", lang.to_string()),
                ("key", self.api_key.clone()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                provider: "places",
                message: if e.is_timeout() {
                    "Request timed out".to_string()
                } else {
                    format!("Request failed: {}", e)
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider {
                provider: "places",
                message: format!(
                    "HTTP {}: {}",
                    status,
                    snippet(&body, PROVIDER_ERROR_SNIPPET_BYTES)
                ),
            });
        }

        let api_response: PlacesResponse =
            response.json().await.map_err(|e| AppError::Provider {
                provider: "places",
                message: format!("Failed to parse response: {}", e),
            })?;

        // The API signals errors in-band with 200s
        if api_response.status != "OK" && api_response.status != "ZERO_RESULTS" {
            return Err(AppError::Provider {
                provider: "places",
                message: format!("API status {}", api_response.status),
            });
        }

        Ok(convert_results(api_response.results))
    }
}

fn convert_results(results: Vec<PlaceResult>) -> Vec<Poi> {
    results
        .into_iter()
        .filter_map(|place| {
            let coords =
                Coordinates::new(place.geometry.location.lat, place.geometry.location.lng).ok()?;
            if place.name.trim().is_empty() {
                return None;
            }
            let mut poi = Poi::new(PoiSource::Places, &place.place_id, place.name, coords);
            poi.kind_hints = place.types;
            Some(poi)
        })
        .collect()
}

// Places API response types

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    geometry: PlaceGeometry,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: PlaceLocation,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    lat: f64,
    lng: f64,
}
