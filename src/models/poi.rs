use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PoiSource {
    Osm,
    Graph,
    Places,
    Anchor,
}

impl fmt::Display for PoiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoiSource::Osm => "osm",
            PoiSource::Graph => "graph",
            PoiSource::Places => "places",
            PoiSource::Anchor => "anchor",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PoiSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "osm" => Ok(PoiSource::Osm),
            "graph" => Ok(PoiSource::Graph),
            "places" => Ok(PoiSource::Places),
            "anchor" => Ok(PoiSource::Anchor),
            _ => Err(format!("Invalid POI source: {}", s)),
        }
    }
}

/// A pointer into the encyclopedia: page language plus title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncyclopediaRef {
    pub lang: String,
    pub title: String,
}

impl EncyclopediaRef {
    /// Parse a `lang:Title` tag value as found on OSM elements.
    /// A bare title (no language prefix) defaults to English.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        match tag.split_once(':') {
            Some((lang, title)) if lang.len() <= 3 && !title.trim().is_empty() => {
                Some(EncyclopediaRef {
                    lang: lang.to_lowercase(),
                    title: title.trim().to_string(),
                })
            }
            _ => Some(EncyclopediaRef {
                lang: "en".to_string(),
                title: tag.to_string(),
            }),
        }
    }
}

/// Normalized point of interest. One surface record over heterogeneous
/// provider shapes; `key` is stable across retries for the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    /// `<source>:<native-id>`, unique across sources
    pub key: String,
    pub source: PoiSource,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
    /// Coarse category tags, most specific first
    #[serde(default)]
    pub kind_hints: Vec<String>,
    /// QID-shaped pointer into the knowledge graph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encyclopedia: Option<EncyclopediaRef>,
    /// Provider-specific tags kept for downstream enrichment
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub raw_tags: HashMap<String, String>,
}

impl Poi {
    pub fn new(source: PoiSource, native_id: &str, label: String, coords: Coordinates) -> Self {
        Poi {
            key: format!("{}:{}", source, native_id),
            source,
            label,
            lat: coords.lat,
            lng: coords.lng,
            kind_hints: Vec::new(),
            graph_id: None,
            encyclopedia: None,
            raw_tags: HashMap::new(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// A POI is only usable downstream if something can be said about it
    pub fn has_identity(&self) -> bool {
        !self.label.trim().is_empty() || self.graph_id.is_some() || self.encyclopedia.is_some()
    }

    /// De-duplication key: lowercased label plus 4-decimal coordinates
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{:.4}|{:.4}",
            self.label.to_lowercase(),
            self.lat,
            self.lng
        )
    }
}
