use async_trait::async_trait;
use roadtale::cache::MemoryCache;
use roadtale::error::{AppError, Result};
use roadtale::exposure::ExposureLog;
use roadtale::history::HistoryStore;
use roadtale::llm::{CompletionOpts, LlmClient};
use roadtale::models::{Coordinates, EncyclopediaRef, Fact, Poi, PoiSource};
use roadtale::providers::PoiProvider;
use roadtale::services::{
    CandidateSelector, EncyclopediaSource, FactService, GraphFactSource, PoiService,
};
use roadtale::story::{Narrator, StoryValidator};
use roadtale::tts::{AudioClip, SpeechSynthesizer};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_MIN_WORDS: usize = 10;
pub const TEST_MAX_WORDS: usize = 60;

/// Provider returning a fixed POI list, optionally failing, counting calls.
pub struct StaticProvider {
    pub provider_name: &'static str,
    pub pois: Vec<Poi>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(provider_name: &'static str, pois: Vec<Poi>) -> Arc<Self> {
        Arc::new(StaticProvider {
            provider_name,
            pois,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(provider_name: &'static str) -> Arc<Self> {
        Arc::new(StaticProvider {
            provider_name,
            pois: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoiProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    async fn fetch(&self, _: &Coordinates, _: f64, _: &str) -> Result<Vec<Poi>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Provider {
                provider: self.provider_name,
                message: "simulated outage".to_string(),
            });
        }
        Ok(self.pois.clone())
    }
}

/// Graph fact source backed by a fixed map.
pub struct StaticGraphSource {
    pub facts: HashMap<String, Vec<Fact>>,
}

#[async_trait]
impl GraphFactSource for StaticGraphSource {
    async fn entity_facts(&self, graph_id: &str, _lang: &str) -> Result<Vec<Fact>> {
        Ok(self.facts.get(graph_id).cloned().unwrap_or_default())
    }
}

/// Encyclopedia source with nothing to say.
pub struct NoEncyclopedia;

#[async_trait]
impl EncyclopediaSource for NoEncyclopedia {
    async fn resolve_sitelink(&self, _: &str, _: &str) -> Result<Option<EncyclopediaRef>> {
        Ok(None)
    }

    async fn fetch_extract(&self, _: &EncyclopediaRef) -> Result<String> {
        Ok(String::new())
    }
}

/// Generator returning scripted responses in order.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(ScriptedLlm {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _system: &str, user: &str, _opts: &CompletionOpts) -> Result<String> {
        self.prompts.lock().unwrap().push(user.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::generator(None, "script exhausted"))
    }
}

/// Synthesizer producing a fixed clip and counting invocations.
pub struct CountingTts {
    pub calls: AtomicUsize,
}

impl CountingTts {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingTts {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for CountingTts {
    async fn synthesize(&self, _text: &str, _lang: &str) -> Result<AudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AudioClip {
            bytes: vec![0u8; 16],
            content_type: "audio/mpeg".to_string(),
        })
    }
}

/// A POI near Westminster with a graph id, offset north by ~`offset_m`.
pub fn graph_poi(id: &str, label: &str, offset_m: f64) -> Poi {
    let lat = 51.5007 + offset_m / 111_111.0;
    let mut poi = Poi::new(
        PoiSource::Graph,
        id,
        label.to_string(),
        Coordinates::new(lat, -0.1246).unwrap(),
    );
    poi.graph_id = Some(id.to_string());
    poi
}

/// Fact set with the requested number of year-anchored and plain facts.
pub fn fact_set(years: usize, plain: usize) -> Vec<Fact> {
    let mut facts = Vec::new();
    for i in 0..years {
        facts.push(
            Fact::from_sentence(&format!("Construction phase {} finished in {}", i, 1820 + i))
                .unwrap(),
        );
    }
    for i in 0..plain {
        facts.push(Fact::from_sentence(&format!("Observation number {} about the site", i)).unwrap());
    }
    facts
}

/// A compliant single-paragraph story inside the test word bounds.
pub fn compliant_story() -> String {
    let sentence = "The tower rose in 1820 and kept its four clock faces.";
    let mut words = Vec::new();
    while words.len() < 30 {
        words.extend(sentence.split_whitespace());
    }
    words.join(" ")
}

pub struct TestHarness {
    pub narrator: Narrator,
    pub history: Arc<HistoryStore>,
    pub tts: Arc<CountingTts>,
}

/// Wire a narrator from mocks. The fan-out order is the order of
/// `providers`; `graph_facts` keys are graph ids.
pub fn build_harness(
    providers: Vec<Arc<dyn PoiProvider>>,
    graph_facts: HashMap<String, Vec<Fact>>,
    llm: Arc<ScriptedLlm>,
) -> TestHarness {
    let cache = Arc::new(MemoryCache::new(
        Duration::from_secs(600),
        Duration::from_secs(600),
    ));
    let poi_service = Arc::new(PoiService::new(
        providers,
        None,
        cache.clone(),
        None,
        Duration::from_secs(600),
    ));
    let fact_service = Arc::new(FactService::new(
        Arc::new(StaticGraphSource { facts: graph_facts }),
        Arc::new(NoEncyclopedia),
        llm.clone(),
        cache,
        HashMap::new(),
    ));
    let selector = Arc::new(CandidateSelector::new(fact_service, 18));
    let history = Arc::new(HistoryStore::new(None));
    let exposure = Arc::new(ExposureLog::new(None));
    let tts = CountingTts::new();
    let validator = StoryValidator::new(TEST_MIN_WORDS, TEST_MAX_WORDS, HashMap::new());

    let narrator = Narrator::new(
        poi_service,
        selector,
        llm,
        tts.clone(),
        history.clone(),
        exposure,
        validator,
        roadtale::constants::RADIUS_STEPS_METERS.to_vec(),
        TEST_MIN_WORDS,
        TEST_MAX_WORDS,
        50.0,
    );

    TestHarness {
        narrator,
        history,
        tts,
    }
}

pub fn origin() -> Coordinates {
    Coordinates::new(51.5007, -0.1246).unwrap()
}
