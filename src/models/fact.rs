use crate::constants::MAX_FACT_CHARS;
use crate::models::Poi;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Four-digit years between 1500 and 2099 count as anchors
pub static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})\b").unwrap());

/// Day-plus-month date forms ("14 July", "July 14", "14.7.1918")
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}\s+(january|february|march|april|may|june|july|august|september|october|november|december)|(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2}|\d{1,2}\.\d{1,2}\.\d{2,4})\b",
    )
    .unwrap()
});

/// Two consecutive capitalized words mid-sentence read as a proper name
static NAMED_PERSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:named after|in honor of|in honour of|by|של)\s+[\p{Lu}][\p{L}]+(?:\s+[\p{Lu}][\p{L}]+)?")
        .unwrap()
});

static NAMED_EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(coronation|exhibition|festival|earthquake|fire of|siege|olympics|world'?s fair|jubilee|restoration|excavation|unveil(?:ed|ing))\b")
        .unwrap()
});

/// A single verifiable atomic fact with the anchor flags used for scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    pub text: String,
    pub has_year: bool,
    pub has_date: bool,
    pub has_named_event: bool,
    pub has_named_person: bool,
}

impl Fact {
    /// Normalize a raw sentence into a fact. Returns None when the sentence
    /// cannot be a fact at all (empty or over length).
    pub fn from_sentence(raw: &str) -> Option<Self> {
        let mut text = raw.trim().to_string();
        if text.is_empty() || text.chars().count() > MAX_FACT_CHARS {
            return None;
        }
        // Terminal punctuation is normalized to a period
        if !text.ends_with('.') && !text.ends_with('!') && !text.ends_with('?') {
            text.push('.');
        }

        Some(Fact {
            has_year: YEAR_RE.is_match(&text),
            has_date: DATE_RE.is_match(&text),
            has_named_event: NAMED_EVENT_RE.is_match(&text),
            has_named_person: NAMED_PERSON_RE.is_match(&text),
            text,
        })
    }

    /// Anchored facts carry a concrete time / name / event marker
    pub fn is_anchored(&self) -> bool {
        self.has_year || self.has_date || self.has_named_event || self.has_named_person
    }

    /// Case-folded form used for de-duplication
    pub fn fold_key(&self) -> String {
        self.text.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FactSourceKind {
    Graph,
    Encyclopedia,
}

/// Provenance entry for the sources a fact set was drawn from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSource {
    #[serde(rename = "type")]
    pub kind: FactSourceKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A POI together with its merged, filtered fact set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiWithFacts {
    pub poi: Poi,
    pub facts: Vec<Fact>,
    pub sources: Vec<FactSource>,
}

impl PoiWithFacts {
    pub fn year_anchor_count(&self) -> usize {
        self.facts.iter().filter(|f| f.has_year).count()
    }

    pub fn anchor_count(&self) -> usize {
        self.facts.iter().filter(|f| f.is_anchored()).count()
    }
}

/// Case-folded de-duplication preserving first-occurrence order.
pub fn dedup_facts(facts: Vec<Fact>) -> Vec<Fact> {
    let mut seen = std::collections::HashSet::new();
    facts
        .into_iter()
        .filter(|f| seen.insert(f.fold_key()))
        .collect()
}
