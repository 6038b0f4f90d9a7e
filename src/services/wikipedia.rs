use crate::constants::{MAX_EXTRACT_CHARS, PROVIDER_ERROR_SNIPPET_BYTES};
use crate::error::{AppError, Result};
use crate::models::EncyclopediaRef;
use crate::providers::snippet;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";

/// Encyclopedia access: sitelink resolution for graph entities and
/// plain-text page extracts.
#[derive(Clone)]
pub struct WikipediaClient {
    client: Client,
    /// `{lang}` is substituted with the page language
    article_api_template: String,
    entity_api_url: String,
    user_agent: String,
    timeout: Duration,
}

impl WikipediaClient {
    pub fn new(user_agent: String, timeout: Duration) -> Self {
        Self::with_endpoints(
            "https://{lang}.wikipedia.org/w/api.php".to_string(),
            WIKIDATA_API_URL.to_string(),
            user_agent,
            timeout,
        )
    }

    pub fn with_endpoints(
        article_api_template: String,
        entity_api_url: String,
        user_agent: String,
        timeout: Duration,
    ) -> Self {
        WikipediaClient {
            client: Client::new(),
            article_api_template,
            entity_api_url,
            user_agent,
            timeout,
        }
    }

    /// Resolve the sitelink for a graph entity, preferring the requested
    /// language, then the he/en/fr fallbacks.
    pub async fn resolve_sitelink(
        &self,
        graph_id: &str,
        lang: &str,
    ) -> Result<Option<EncyclopediaRef>> {
        let response = self
            .client
            .get(&self.entity_api_url)
            .query(&[
                ("action", "wbgetentities"),
                ("ids", graph_id),
                ("props", "sitelinks"),
                ("format", "json"),
            ])
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                provider: "wikipedia",
                message: format!("Sitelink request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider {
                provider: "wikipedia",
                message: format!(
                    "HTTP {}: {}",
                    status,
                    snippet(&body, PROVIDER_ERROR_SNIPPET_BYTES)
                ),
            });
        }

        let parsed: EntitiesResponse = response.json().await.map_err(|e| AppError::Provider {
            provider: "wikipedia",
            message: format!("Failed to parse sitelinks: {}", e),
        })?;

        let sitelinks = parsed
            .entities
            .get(graph_id)
            .map(|e| &e.sitelinks)
            .cloned()
            .unwrap_or_default();

        Ok(pick_sitelink(&sitelinks, lang))
    }

    /// Plain-text extract of a page, truncated to the working cap.
    pub async fn fetch_extract(&self, page: &EncyclopediaRef) -> Result<String> {
        let url = self.article_api_template.replace("{lang}", &page.lang);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", page.title.as_str()),
            ])
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Provider {
                provider: "wikipedia",
                message: format!("Extract request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider {
                provider: "wikipedia",
                message: format!(
                    "HTTP {}: {}",
                    status,
                    snippet(&body, PROVIDER_ERROR_SNIPPET_BYTES)
                ),
            });
        }

        let parsed: ExtractResponse = response.json().await.map_err(|e| AppError::Provider {
            provider: "wikipedia",
            message: format!("Failed to parse extract: {}", e),
        })?;

        let extract = parsed
            .query
            .pages
            .into_values()
            .next()
            .and_then(|p| p.extract)
            .unwrap_or_default();

        Ok(truncate_chars(&extract, MAX_EXTRACT_CHARS))
    }
}

/// Sitelink preference chain: requested language, then he, en, fr.
fn pick_sitelink(
    sitelinks: &HashMap<String, Sitelink>,
    lang: &str,
) -> Option<EncyclopediaRef> {
    // Sitelink sites use bare language codes; strip any region subtag
    let primary = lang.split('-').next().unwrap_or(lang);
    let mut chain = vec![format!("{}wiki", primary)];
    for fallback in ["hewiki", "enwiki", "frwiki"] {
        if !chain.iter().any(|c| c == fallback) {
            chain.push(fallback.to_string());
        }
    }

    for site in chain {
        if let Some(link) = sitelinks.get(&site) {
            let page_lang = site.trim_end_matches("wiki").to_string();
            return Some(EncyclopediaRef {
                lang: page_lang,
                title: link.title.clone(),
            });
        }
    }
    None
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.chars().take(max_chars).collect()
}

// MediaWiki API response types

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Clone, Deserialize)]
struct Entity {
    #[serde(default)]
    sitelinks: HashMap<String, Sitelink>,
}

#[derive(Debug, Clone, Deserialize)]
struct Sitelink {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sitelinks(sites: &[(&str, &str)]) -> HashMap<String, Sitelink> {
        sites
            .iter()
            .map(|(site, title)| {
                (
                    site.to_string(),
                    Sitelink {
                        title: title.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_pick_sitelink_prefers_requested_language() {
        let links = sitelinks(&[("enwiki", "Big Ben"), ("frwiki", "Big Ben (fr)")]);
        let r = pick_sitelink(&links, "fr").unwrap();
        assert_eq!(r.lang, "fr");
        assert_eq!(r.title, "Big Ben (fr)");
    }

    #[test]
    fn test_pick_sitelink_fallback_chain() {
        let links = sitelinks(&[("frwiki", "Tour Eiffel")]);
        // Requested language missing, he/en missing, fr catches
        let r = pick_sitelink(&links, "de").unwrap();
        assert_eq!(r.lang, "fr");

        assert!(pick_sitelink(&HashMap::new(), "en").is_none());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte safety
        assert_eq!(truncate_chars("מגדל", 2), "מג");
    }

    #[test]
    fn test_extract_response_parsing() {
        let json = serde_json::json!({
            "query": {"pages": {"123": {"extract": "Big Ben is a clock tower."}}}
        });
        let parsed: ExtractResponse = serde_json::from_value(json).unwrap();
        let extract = parsed.query.pages.into_values().next().unwrap().extract;
        assert_eq!(extract.as_deref(), Some("Big Ben is a clock tower."));
    }
}
