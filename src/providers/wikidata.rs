use crate::constants::{PROVIDER_ERROR_SNIPPET_BYTES, WIKIDATA_PROXIMITY_LIMIT};
use crate::error::{AppError, Result};
use crate::models::{Coordinates, Fact, Poi, PoiSource};
use crate::providers::{snippet, PoiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

const SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

#[derive(Clone)]
pub struct WikidataProvider {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl WikidataProvider {
    pub fn new(user_agent: String, timeout: Duration) -> Self {
        Self::with_endpoint(SPARQL_ENDPOINT.to_string(), user_agent, timeout)
    }

    pub fn with_endpoint(endpoint: String, user_agent: String, timeout: Duration) -> Self {
        WikidataProvider {
            client: Client::new(),
            endpoint,
            user_agent,
            timeout,
        }
    }

    /// Label localization chain: requested language first, then the
    /// service's broader fallbacks.
    fn label_languages(lang: &str) -> String {
        format!("{},he,en,fr", lang)
    }

    fn proximity_query(center: &Coordinates, radius_meters: f64, lang: &str) -> String {
        let radius_km = (radius_meters / 1000.0).max(0.1);
        format!(
            r#"SELECT ?place ?placeLabel ?placeDescription ?lat ?lon WHERE {{
  SERVICE wikibase:around {{
    ?place wdt:P625 ?location .
    bd:serviceParam wikibase:center "Point({lng} {lat})"^^geo:wktLiteral .
    bd:serviceParam wikibase:radius "{radius_km:.2}" .
  }}
  ?place p:P625/psv:P625 ?coord .
  ?coord wikibase:geoLatitude ?lat .
  ?coord wikibase:geoLongitude ?lon .
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "{langs}". }}
}}
LIMIT {limit}"#,
            lng = center.lng,
            lat = center.lat,
            radius_km = radius_km,
            langs = Self::label_languages(lang),
            limit = WIKIDATA_PROXIMITY_LIMIT,
        )
    }

    fn facts_query(graph_id: &str, lang: &str) -> String {
        format!(
            r#"SELECT ?desc ?typeLabel ?inception ?namedAfterLabel ?heritageLabel ?eventLabel WHERE {{
  OPTIONAL {{ wd:{qid} schema:description ?desc . FILTER(LANG(?desc) = "{lang}") }}
  OPTIONAL {{ wd:{qid} wdt:P31 ?type . }}
  OPTIONAL {{ wd:{qid} wdt:P571 ?inception . }}
  OPTIONAL {{ wd:{qid} wdt:P138 ?namedAfter . }}
  OPTIONAL {{ wd:{qid} wdt:P1435 ?heritage . }}
  OPTIONAL {{ wd:{qid} wdt:P793 ?event . }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "{langs}". }}
}}"#,
            qid = graph_id,
            lang = lang,
            langs = Self::label_languages(lang),
        )
    }

    async fn run_query(&self, query: &str) -> Result<SparqlResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                provider: "graph",
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
                provider: "graph",
                message: format!(
                    "HTTP {}: {}",
                    status,
                    snippet(&body, PROVIDER_ERROR_SNIPPET_BYTES)
                ),
            });
        }

        response.json().await.map_err(|e| AppError::Provider {
            provider: "graph",
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Structured claims for one entity, rendered as terse single-sentence
    /// facts in a stable order: description, type, inception year, named
    /// after, heritage designation, notable events.
    pub async fn entity_facts(&self, graph_id: &str, lang: &str) -> Result<Vec<Fact>> {
        let query = Self::facts_query(graph_id, lang);
        let response = self.run_query(&query).await?;
        Ok(synthesize_entity_facts(&response.results.bindings))
    }
}

fn binding_value(binding: &SparqlBinding, key: &str) -> Option<String> {
    binding.values.get(key).map(|v| v.value.clone())
}

/// Entity ids arrive as full URIs; callers want the bare QID.
fn qid_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Inception values arrive as xsd:dateTime strings; the year is the claim.
fn year_from_datetime(value: &str) -> Option<i32> {
    let lead: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    lead.parse().ok()
}

fn synthesize_entity_facts(bindings: &[SparqlBinding]) -> Vec<Fact> {
    let mut description: Option<String> = None;
    let mut types = BTreeSet::new();
    let mut inception_year: Option<i32> = None;
    let mut named_after = BTreeSet::new();
    let mut heritage = BTreeSet::new();
    let mut events = BTreeSet::new();

    for b in bindings {
        if description.is_none() {
            description = binding_value(b, "desc");
        }
        if let Some(t) = binding_value(b, "typeLabel") {
            // Unresolved labels echo the QID back; skip those
            if !t.starts_with('Q') || !t[1..].chars().all(|c| c.is_ascii_digit()) {
                types.insert(t);
            }
        }
        if let Some(raw) = binding_value(b, "inception") {
            if let Some(year) = year_from_datetime(&raw) {
                inception_year = Some(inception_year.map_or(year, |y: i32| y.min(year)));
            }
        }
        if let Some(n) = binding_value(b, "namedAfterLabel") {
            named_after.insert(n);
        }
        if let Some(h) = binding_value(b, "heritageLabel") {
            heritage.insert(h);
        }
        if let Some(e) = binding_value(b, "eventLabel") {
            events.insert(e);
        }
    }

    let mut lines = Vec::new();
    if let Some(desc) = description {
        lines.push(format!("Description: {}.", desc));
    }
    if !types.is_empty() {
        lines.push(format!(
            "Type: {}.",
            types.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(year) = inception_year {
        lines.push(format!("Inception year: {}.", year));
    }
    if !named_after.is_empty() {
        lines.push(format!(
            "Named after: {}.",
            named_after.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if !heritage.is_empty() {
        lines.push(format!(
            "Heritage designation: {}.",
            heritage.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    for event in events {
        lines.push(format!("Notable event: {}.", event));
    }

    lines
        .iter()
        .filter_map(|line| Fact::from_sentence(line))
        .collect()
}

#[async_trait]
impl PoiProvider for WikidataProvider {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn fetch(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        lang: &str,
    ) -> Result<Vec<Poi>> {
        let query = Self::proximity_query(center, radius_meters, lang);
        let response = self.run_query(&query).await?;

        let pois = response
            .results
            .bindings
            .into_iter()
            .filter_map(|b| {
                let uri = binding_value(&b, "place")?;
                let qid = qid_from_uri(&uri).to_string();
                let lat: f64 = binding_value(&b, "lat")?.parse().ok()?;
                let lng: f64 = binding_value(&b, "lon")?.parse().ok()?;
                let coords = Coordinates::new(lat, lng).ok()?;

                let label = binding_value(&b, "placeLabel")?;
                // An unresolved label is just the QID again; such entities
                // have nothing to say in any of our languages
                if label == qid {
                    return None;
                }

                let mut poi = Poi::new(PoiSource::Graph, &qid, label, coords);
                poi.graph_id = Some(qid);
                if let Some(desc) = binding_value(&b, "placeDescription") {
                    poi.raw_tags.insert("description".to_string(), desc);
                }
                Some(poi)
            })
            .collect();

        Ok(pois)
    }
}

// SPARQL JSON response types

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    #[serde(flatten)]
    values: std::collections::HashMap<String, SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}
