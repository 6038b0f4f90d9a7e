use crate::cache::{encyclopedia_facts_key, graph_facts_key, MemoryCache};
use crate::constants::*;
use crate::error::Result;
use crate::llm::{CompletionOpts, LlmClient};
use crate::models::fact::YEAR_RE;
use crate::models::{
    dedup_facts, EncyclopediaRef, Fact, FactSource, FactSourceKind, Poi, PoiWithFacts,
};
use crate::providers::WikidataProvider;
use crate::services::wikipedia::WikipediaClient;
use crate::story::lexicon::Lexicon;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Numbers of at least two digits paired with a signal token mark a
/// sentence as substantive
static BIG_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{2,}\b").unwrap());

/// Structured claims for one knowledge-graph entity.
#[async_trait]
pub trait GraphFactSource: Send + Sync {
    async fn entity_facts(&self, graph_id: &str, lang: &str) -> Result<Vec<Fact>>;
}

#[async_trait]
impl GraphFactSource for WikidataProvider {
    async fn entity_facts(&self, graph_id: &str, lang: &str) -> Result<Vec<Fact>> {
        WikidataProvider::entity_facts(self, graph_id, lang).await
    }
}

/// Encyclopedia access: sitelink resolution plus plain-text extracts.
#[async_trait]
pub trait EncyclopediaSource: Send + Sync {
    async fn resolve_sitelink(
        &self,
        graph_id: &str,
        lang: &str,
    ) -> Result<Option<EncyclopediaRef>>;
    async fn fetch_extract(&self, page: &EncyclopediaRef) -> Result<String>;
}

#[async_trait]
impl EncyclopediaSource for WikipediaClient {
    async fn resolve_sitelink(
        &self,
        graph_id: &str,
        lang: &str,
    ) -> Result<Option<EncyclopediaRef>> {
        WikipediaClient::resolve_sitelink(self, graph_id, lang).await
    }

    async fn fetch_extract(&self, page: &EncyclopediaRef) -> Result<String> {
        WikipediaClient::fetch_extract(self, page).await
    }
}

/// Fact assembly for one POI: structured claims from the knowledge graph,
/// encyclopedia sentences distilled into atomic facts by the generator,
/// sensitive-content filtering, and a case-folded merge.
pub struct FactService {
    graph: Arc<dyn GraphFactSource>,
    wikipedia: Arc<dyn EncyclopediaSource>,
    llm: Arc<dyn LlmClient>,
    cache: Arc<MemoryCache>,
    extra_sensitive: HashMap<String, Vec<String>>,
}

impl FactService {
    pub fn new(
        graph: Arc<dyn GraphFactSource>,
        wikipedia: Arc<dyn EncyclopediaSource>,
        llm: Arc<dyn LlmClient>,
        cache: Arc<MemoryCache>,
        extra_sensitive: HashMap<String, Vec<String>>,
    ) -> Self {
        FactService {
            graph,
            wikipedia,
            llm,
            cache,
            extra_sensitive,
        }
    }

    /// Merged fact set for a POI. Knowledge-source failures degrade to
    /// empty contributions; only generator errors propagate.
    pub async fn facts_for(&self, poi: &Poi, lang: &str) -> Result<PoiWithFacts> {
        let mut facts = Vec::new();
        let mut sources = Vec::new();

        if let Some(ref graph_id) = poi.graph_id {
            let graph_facts = self.graph_facts(graph_id, lang).await;
            if !graph_facts.is_empty() {
                sources.push(FactSource {
                    kind: FactSourceKind::Graph,
                    url: format!("https://www.wikidata.org/wiki/{}", graph_id),
                    title: Some(poi.label.clone()),
                });
            }
            facts.extend(graph_facts);
        }

        if let Some(page) = self.resolve_page(poi, lang).await {
            let wiki_facts = self.encyclopedia_facts(&page, &poi.label).await?;
            if !wiki_facts.is_empty() {
                sources.push(FactSource {
                    kind: FactSourceKind::Encyclopedia,
                    url: format!(
                        "https://{}.wikipedia.org/wiki/{}",
                        page.lang,
                        urlencoding::encode(&page.title)
                    ),
                    title: Some(page.title.clone()),
                });
            }
            facts.extend(wiki_facts);
        }

        let merged = dedup_facts(facts);
        let filtered = filter_sensitive(merged, lang, &self.extra_sensitive);
        let capped: Vec<Fact> = filtered.into_iter().take(MAX_FACTS_PER_POI).collect();

        Ok(PoiWithFacts {
            poi: poi.clone(),
            facts: capped,
            sources,
        })
    }

    async fn graph_facts(&self, graph_id: &str, lang: &str) -> Vec<Fact> {
        let key = graph_facts_key(graph_id, lang);
        if let Some(cached) = self.cache.get_facts(&key).await {
            return cached;
        }

        match self.graph.entity_facts(graph_id, lang).await {
            Ok(facts) => {
                self.cache.put_facts(&key, &facts).await;
                facts
            }
            Err(e) => {
                tracing::warn!("Graph facts unavailable for {}: {}", graph_id, e);
                Vec::new()
            }
        }
    }

    /// Page reference preference: the provider-supplied tag, else the
    /// graph sitelink in the requested language with fallbacks.
    async fn resolve_page(&self, poi: &Poi, lang: &str) -> Option<EncyclopediaRef> {
        if let Some(ref page) = poi.encyclopedia {
            return Some(page.clone());
        }
        let graph_id = poi.graph_id.as_ref()?;
        match self.wikipedia.resolve_sitelink(graph_id, lang).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Sitelink resolution failed for {}: {}", graph_id, e);
                None
            }
        }
    }

    async fn encyclopedia_facts(&self, page: &EncyclopediaRef, label: &str) -> Result<Vec<Fact>> {
        let key = encyclopedia_facts_key(&page.lang, &page.title);
        if let Some(cached) = self.cache.get_facts(&key).await {
            return Ok(cached);
        }

        let extract = match self.wikipedia.fetch_extract(page).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!("Extract unavailable for {}: {}", page.title, e);
                return Ok(Vec::new());
            }
        };

        let candidates = select_candidate_sentences(&extract, &page.lang);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let facts = self.distill_atomic_facts(label, &candidates).await?;
        self.cache.put_facts(&key, &facts).await;
        Ok(facts)
    }

    /// JSON-only extraction call: the model reads candidate sentences and
    /// returns atomic facts, nothing else.
    async fn distill_atomic_facts(&self, label: &str, sentences: &[String]) -> Result<Vec<Fact>> {
        let system = "You extract verifiable atomic facts from encyclopedia text. \
                      Respond with a JSON array of strings and nothing else: no prose, \
                      no markdown, no code fences.";
        let user = format!(
            "Extract between {} and {} atomic facts about \"{}\" from the sentences below.\n\
             Rules: one short sentence per fact; use only what the sentences state; \
             no outside knowledge; no duplicates; keep concrete details \
             (years, names, numbers) intact.\n\nSENTENCES:\n{}",
            ATOMIC_FACTS_MIN,
            ATOMIC_FACTS_MAX,
            label,
            sentences
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n"),
        );

        let opts = CompletionOpts {
            temperature: 0.2,
            max_tokens: 900,
        };
        let raw = self.llm.complete(system, &user, &opts).await?;

        let lines = parse_fact_array(&raw);
        let facts = lines
            .iter()
            .filter_map(|line| Fact::from_sentence(line))
            .collect();
        Ok(dedup_facts(facts))
    }
}

/// Split plain text on sentence terminators, keeping the terminator.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if c == '.' || c == '!' || c == '?' {
            let s = current.trim().to_string();
            if !s.is_empty() {
                sentences.push(s);
            }
            current.clear();
        }
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Candidate rules: workable length, and either a year in range, a big
/// number next to a signal token, or a signal token alone. When nothing
/// qualifies, the leading sentences go in as-is.
pub fn select_candidate_sentences(extract: &str, lang: &str) -> Vec<String> {
    let lexicon = Lexicon::for_lang(lang);
    let sentences = split_sentences(extract);

    let candidates: Vec<String> = sentences
        .iter()
        .filter(|s| {
            let len = s.chars().count();
            if !(MIN_SENTENCE_CHARS..=MAX_FACT_CHARS).contains(&len) {
                return false;
            }
            let has_signal = lexicon.has_signal_token(s);
            YEAR_RE.is_match(s) || (BIG_NUMBER_RE.is_match(s) && has_signal) || has_signal
        })
        .cloned()
        .collect();

    if candidates.is_empty() {
        sentences.into_iter().take(FALLBACK_SENTENCE_COUNT).collect()
    } else {
        candidates
    }
}

/// Tolerant JSON-array parsing: strip code fences, then fall back to the
/// outermost bracket pair when the model wrapped the array in prose.
pub fn parse_fact_array(raw: &str) -> Vec<String> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(lines) = serde_json::from_str::<Vec<String>>(cleaned) {
        return lines;
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(lines) = serde_json::from_str::<Vec<String>>(&cleaned[start..=end]) {
                return lines;
            }
        }
    }

    Vec::new()
}

/// Line-level sensitive filter: a flagged fact is dropped, the rest of the
/// set is retained. Every supported language's denylist applies.
pub fn filter_sensitive(
    facts: Vec<Fact>,
    lang: &str,
    extra: &HashMap<String, Vec<String>>,
) -> Vec<Fact> {
    let no_extras = Vec::new();
    facts
        .into_iter()
        .filter(|fact| {
            for lexicon in Lexicon::all() {
                let extras = if lexicon.lang == Lexicon::for_lang(lang).lang {
                    extra.get(lexicon.lang).unwrap_or(&no_extras)
                } else {
                    &no_extras
                };
                if let Some(pattern) = lexicon.find_sensitive(&fact.text, extras) {
                    tracing::debug!("Dropping sensitive fact ({}): {}", pattern, fact.text);
                    return false;
                }
            }
            true
        })
        .collect()
}
