use crate::constants::*;
use crate::error::Result;
use crate::models::{Coordinates, Poi, PoiWithFacts};
use crate::services::facts::FactService;
use std::collections::HashSet;
use std::sync::Arc;

/// A candidate that passed the story-potential gate, with its scoring
/// inputs kept for the envelope.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub enriched: PoiWithFacts,
    pub distance_meters: f64,
    pub score: f64,
}

/// Candidate selection: distance and history filtering, fact enrichment
/// for the nearest survivors, the story-potential gate, and a
/// distance-minus-density score where lower wins.
pub struct CandidateSelector {
    facts: Arc<FactService>,
    max_candidates: usize,
    /// Optional cutoff: a winner scoring above it is discarded
    score_ceiling: Option<f64>,
}

impl CandidateSelector {
    pub fn new(facts: Arc<FactService>, max_candidates: usize) -> Self {
        CandidateSelector {
            facts,
            max_candidates,
            score_ceiling: None,
        }
    }

    pub fn with_score_ceiling(mut self, ceiling: Option<f64>) -> Self {
        self.score_ceiling = ceiling;
        self
    }

    pub async fn select(
        &self,
        origin: &Coordinates,
        pois: &[Poi],
        heard: &HashSet<String>,
        lang: &str,
    ) -> Result<Option<ScoredCandidate>> {
        let mut ranked = rank_by_distance(origin, pois, heard);
        ranked.truncate(self.max_candidates.min(MAX_SCORED_CANDIDATES));

        let mut best: Option<ScoredCandidate> = None;
        for (poi, distance) in ranked {
            let enriched = self.facts.facts_for(&poi, lang).await?;

            if !passes_story_gate(&enriched) {
                tracing::debug!(
                    "{} rejected by story gate: {} facts, {} year anchors",
                    poi.key,
                    enriched.facts.len(),
                    enriched.year_anchor_count()
                );
                continue;
            }

            let score = candidate_score(distance, &enriched);
            // Strict comparison keeps the earlier candidate on ties
            let better = best.as_ref().map_or(true, |b| score < b.score);
            if better {
                best = Some(ScoredCandidate {
                    enriched,
                    distance_meters: distance,
                    score,
                });
            }
        }

        if let (Some(ceiling), Some(winner)) = (self.score_ceiling, best.as_ref()) {
            if winner.score > ceiling {
                tracing::debug!(
                    "Winner {} over the score ceiling ({:.0} > {:.0}), staying silent",
                    winner.enriched.poi.key,
                    winner.score,
                    ceiling
                );
                return Ok(None);
            }
        }

        Ok(best)
    }
}

/// Distance-filtered, history-filtered candidates, nearest first.
pub fn rank_by_distance(
    origin: &Coordinates,
    pois: &[Poi],
    heard: &HashSet<String>,
) -> Vec<(Poi, f64)> {
    let mut ranked: Vec<(Poi, f64)> = pois
        .iter()
        .map(|poi| (poi.clone(), origin.distance_meters(&poi.coordinates())))
        .filter(|(poi, d)| *d <= MAX_CANDIDATE_DISTANCE_METERS && !heard.contains(&poi.key))
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Story-potential gate: enough facts, enough year anchors.
pub fn passes_story_gate(enriched: &PoiWithFacts) -> bool {
    enriched.facts.len() >= MIN_FACTS_TO_SPEAK
        && enriched.year_anchor_count() >= MIN_YEAR_ANCHORS_TO_SPEAK
}

/// `distance - boost`: nearer and denser wins.
pub fn candidate_score(distance_meters: f64, enriched: &PoiWithFacts) -> f64 {
    let fact_boost =
        enriched.facts.len().min(FACT_COUNT_BOOST_CAP) as f64 * FACT_COUNT_BOOST_PER_FACT;
    let anchor_boost =
        enriched.anchor_count().min(ANCHOR_BOOST_CAP) as f64 * ANCHOR_BOOST_PER_ANCHOR;
    distance_meters - fact_boost - anchor_boost
}
