use crate::constants::{OVERPASS_ELEMENT_LIMIT, PROVIDER_ERROR_SNIPPET_BYTES};
use crate::error::{AppError, Result};
use crate::models::{Coordinates, EncyclopediaRef, Poi, PoiSource};
use crate::providers::{snippet, PoiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Tag selectors for the union query. `None` means any value of the key,
/// name-tagged only; specific values also require a name.
const SELECTORS: &[(&str, Option<&str>)] = &[
    ("historic", None),
    ("tourism", Some("attraction")),
    ("tourism", Some("viewpoint")),
    ("historic", Some("memorial")),
    ("natural", None),
    ("place", None),
];

#[derive(Clone)]
pub struct OverpassProvider {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl OverpassProvider {
    pub fn new(base_url: String, user_agent: String, timeout: Duration) -> Self {
        OverpassProvider {
            client: Client::new(),
            base_url,
            user_agent,
            timeout,
        }
    }

    fn build_query(&self, center: &Coordinates, radius_meters: f64) -> String {
        let mut query_parts = vec![format!(
            "[out:json][timeout:{}];(",
            self.timeout.as_secs().max(1)
        )];

        for (key, value) in SELECTORS {
            let tag_query = match value {
                Some(v) => format!(
                    r#"nwr["{}"="{}"]["name"](around:{},{},{});"#,
                    key, v, radius_meters, center.lat, center.lng
                ),
                None => format!(
                    r#"nwr["{}"]["name"](around:{},{},{});"#,
                    key, radius_meters, center.lat, center.lng
                ),
            };
            query_parts.push(tag_query);
        }

        query_parts.push(format!(");out center {};", OVERPASS_ELEMENT_LIMIT));
        query_parts.join("\n")
    }

    fn convert_elements(&self, elements: Vec<OverpassElement>) -> Vec<Poi> {
        elements
            .into_iter()
            .filter_map(|elem| {
                // Nodes carry coordinates directly; ways/relations via center
                let (lat, lng) = if let (Some(lat), Some(lon)) = (elem.lat, elem.lon) {
                    (lat, lon)
                } else if let Some(center) = elem.center {
                    (center.lat, center.lon)
                } else {
                    return None;
                };
                let coords = Coordinates::new(lat, lng).ok()?;

                let tags = elem.tags;
                let encyclopedia = tags
                    .get("wikipedia")
                    .and_then(|t| EncyclopediaRef::from_tag(t));

                let label = tags
                    .get("name")
                    .or_else(|| tags.get("name:he"))
                    .or_else(|| tags.get("name:en"))
                    .cloned()
                    .or_else(|| encyclopedia.as_ref().map(|r| r.title.clone()))?;

                let native_id = format!("{}/{}", elem.kind, elem.id);
                let mut poi = Poi::new(PoiSource::Osm, &native_id, label, coords);
                poi.kind_hints = kind_hints(&tags);
                poi.graph_id = tags.get("wikidata").cloned();
                poi.encyclopedia = encyclopedia;
                poi.raw_tags = tags;

                Some(poi)
            })
            .collect()
    }
}

/// Coarse category hints drawn from the tags that selected the element,
/// most specific first.
fn kind_hints(tags: &HashMap<String, String>) -> Vec<String> {
    let mut hints = Vec::new();
    for key in ["historic", "tourism", "natural", "place"] {
        if let Some(value) = tags.get(key) {
            if value == "yes" {
                hints.push(key.to_string());
            } else {
                hints.push(format!("{}:{}", key, value));
            }
        }
    }
    hints
}

#[async_trait]
impl PoiProvider for OverpassProvider {
    fn name(&self) -> &'static str {
        "osm"
    }

    async fn fetch(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        _lang: &str,
    ) -> Result<Vec<Poi>> {
        let query = self.build_query(center, radius_meters);
        tracing::debug!("Overpass query: {}", query);

        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("User-Agent", &self.user_agent)
            .body(format!("data={}", urlencoding::encode(&query)))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                provider: "osm",
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
                provider: "osm",
                message: format!(
                    "HTTP {}: {}",
                    status,
                    snippet(&body, PROVIDER_ERROR_SNIPPET_BYTES)
                ),
            });
        }

        let api_response: OverpassResponse =
            response.json().await.map_err(|e| AppError::Provider {
                provider: "osm",
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_elements(api_response.elements))
    }
}

// Overpass API response types

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}
