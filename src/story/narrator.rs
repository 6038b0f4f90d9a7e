use crate::constants::MAX_FACTS_IN_RESPONSE;
use crate::error::Result;
use crate::exposure::ExposureLog;
use crate::history::HistoryStore;
use crate::llm::{CompletionOpts, LlmClient};
use crate::models::decision::{REASON_FINAL_VALIDATION_PREFIX, REASON_NO_STRONG_POI};
use crate::models::{round_display_distance, Coordinates, Decision, TasteProfile};
use crate::services::poi_service::PoiService;
use crate::services::scoring::{CandidateSelector, ScoredCandidate};
use crate::story::prompt::{build_facts_block, repair_prompt, system_prompt, user_prompt};
use crate::story::validator::{StoryValidator, ValidationFailure};
use crate::tts::{AudioClip, SpeechSynthesizer};
use std::sync::Arc;

/// The decision envelope plus audio when speaking.
pub struct Narration {
    pub decision: Decision,
    pub audio: Option<AudioClip>,
}

/// Binds the whole pipeline: expanding-radius candidate search, grounded
/// generation with validation and one repair pass, speech synthesis,
/// history marking and exposure logging. Prefers silence over fabrication.
pub struct Narrator {
    pois: Arc<PoiService>,
    selector: Arc<CandidateSelector>,
    llm: Arc<dyn LlmClient>,
    tts: Arc<dyn SpeechSynthesizer>,
    history: Arc<HistoryStore>,
    exposure: Arc<ExposureLog>,
    validator: StoryValidator,
    /// Expanding-radius ladder in meters, strictly increasing
    radius_steps: Vec<f64>,
    min_words: usize,
    max_words: usize,
    display_step_m: f64,
}

impl Narrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pois: Arc<PoiService>,
        selector: Arc<CandidateSelector>,
        llm: Arc<dyn LlmClient>,
        tts: Arc<dyn SpeechSynthesizer>,
        history: Arc<HistoryStore>,
        exposure: Arc<ExposureLog>,
        validator: StoryValidator,
        radius_steps: Vec<f64>,
        min_words: usize,
        max_words: usize,
        display_step_m: f64,
    ) -> Self {
        Narrator {
            pois,
            selector,
            llm,
            tts,
            history,
            exposure,
            validator,
            radius_steps,
            min_words,
            max_words,
            display_step_m,
        }
    }

    pub async fn narrate(
        &self,
        origin: Coordinates,
        user_key: &str,
        lang: &str,
        taste: &TasteProfile,
        taste_profile_id: Option<&str>,
    ) -> Result<Narration> {
        let candidate = match self.find_candidate(&origin, user_key, lang).await? {
            Some(candidate) => candidate,
            None => {
                let decision = Decision::silent(REASON_NO_STRONG_POI);
                self.exposure
                    .record(user_key, origin.lat, origin.lng, taste_profile_id, &decision)
                    .await;
                return Ok(Narration {
                    decision,
                    audio: None,
                });
            }
        };

        let display_distance =
            round_display_distance(candidate.distance_meters, self.display_step_m);
        let facts_block = build_facts_block(
            &candidate.enriched.poi.label,
            display_distance,
            lang,
            &candidate.enriched.facts,
        );

        let story = match self.generate_validated(&facts_block, lang, taste).await? {
            Ok(story) => story,
            Err(reason) => {
                let response_facts = candidate
                    .enriched
                    .facts
                    .iter()
                    .take(MAX_FACTS_IN_RESPONSE)
                    .cloned()
                    .collect();
                let decision = Decision::silent_about(
                    reason,
                    candidate.enriched.poi,
                    response_facts,
                    display_distance,
                );
                self.exposure
                    .record(user_key, origin.lat, origin.lng, taste_profile_id, &decision)
                    .await;
                return Ok(Narration {
                    decision,
                    audio: None,
                });
            }
        };

        // TTS first: a synthesis failure must leave the POI unheard so a
        // retry can narrate it again
        let audio = self.tts.synthesize(&story, lang).await?;

        self.history
            .mark_heard(user_key, &candidate.enriched.poi.key)
            .await;

        let response_facts: Vec<_> = candidate
            .enriched
            .facts
            .iter()
            .take(MAX_FACTS_IN_RESPONSE)
            .cloned()
            .collect();
        let decision = Decision::spoken(
            candidate.enriched.poi,
            response_facts,
            story,
            display_distance,
        );
        self.exposure
            .record(user_key, origin.lat, origin.lng, taste_profile_id, &decision)
            .await;

        Ok(Narration {
            decision,
            audio: Some(audio),
        })
    }

    /// Expanding-radius search: the first radius that yields a gated
    /// candidate wins; a dry ladder means no strong POI nearby.
    async fn find_candidate(
        &self,
        origin: &Coordinates,
        user_key: &str,
        lang: &str,
    ) -> Result<Option<ScoredCandidate>> {
        let heard = self.history.heard_set(user_key).await;

        for &radius in &self.radius_steps {
            let pois = self.pois.nearby(origin, radius, lang).await;
            if pois.is_empty() {
                continue;
            }
            if let Some(candidate) = self.selector.select(origin, &pois, &heard, lang).await? {
                tracing::info!(
                    "Selected {} at {:.0}m (score {:.0}, {} facts) within {}m",
                    candidate.enriched.poi.key,
                    candidate.distance_meters,
                    candidate.score,
                    candidate.enriched.facts.len(),
                    radius
                );
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Generation plus validation, with one corrective pass. The inner
    /// result distinguishes a usable story from a silent-decision reason.
    async fn generate_validated(
        &self,
        facts_block: &str,
        lang: &str,
        taste: &TasteProfile,
    ) -> Result<std::result::Result<String, String>> {
        let opts = CompletionOpts {
            temperature: 0.8,
            max_tokens: (self.max_words * 2) as u32,
        };
        let system = system_prompt(lang);
        let user = user_prompt(facts_block, lang, self.min_words, self.max_words, taste);

        let draft = self.llm.complete(&system, &user, &opts).await?;
        let failure = match self.validator.validate(&draft, lang) {
            Ok(()) => return Ok(Ok(draft)),
            Err(failure) => failure,
        };

        if failure == ValidationFailure::ModelNoStory {
            return Ok(Err(failure.tag().to_string()));
        }

        tracing::info!("Draft rejected ({}), attempting repair", failure);

        let repair = repair_prompt(
            facts_block,
            lang,
            self.min_words,
            self.max_words,
            failure.tag(),
            &draft,
        );
        let rewrite = self.llm.complete(&system, &repair, &opts).await?;

        match self.validator.validate(&rewrite, lang) {
            Ok(()) => Ok(Ok(rewrite)),
            Err(second) => {
                tracing::info!("Repair rejected ({}), staying silent", second);
                Ok(Err(format!(
                    "{}{}",
                    REASON_FINAL_VALIDATION_PREFIX,
                    second.tag()
                )))
            }
        }
    }
}
