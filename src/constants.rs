// Application-wide constants
// This module centralizes all magic numbers and hardcoded values for better maintainability

// Server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";

// Expanding-radius search ladder (meters). Strictly increasing, max <= 2500.
pub const RADIUS_STEPS_METERS: [f64; 4] = [500.0, 900.0, 1500.0, 2400.0];

// Candidate selection
/// Candidates farther than this are never narrated
pub const MAX_CANDIDATE_DISTANCE_METERS: f64 = 2200.0;
/// How many nearest candidates get the (expensive) fact treatment
pub const MAX_SCORED_CANDIDATES: usize = 18;
/// Story-potential gate: minimum merged facts
pub const MIN_FACTS_TO_SPEAK: usize = 10;
/// Story-potential gate: minimum facts carrying a year anchor
pub const MIN_YEAR_ANCHORS_TO_SPEAK: usize = 2;

// Score weights (lower score wins; distance in meters minus these boosts)
pub const FACT_COUNT_BOOST_PER_FACT: f64 = 80.0;
pub const FACT_COUNT_BOOST_CAP: usize = 20;
pub const ANCHOR_BOOST_PER_ANCHOR: f64 = 220.0;
pub const ANCHOR_BOOST_CAP: usize = 10;

// Fact assembly
/// Hard cap on merged facts per POI
pub const MAX_FACTS_PER_POI: usize = 22;
/// Facts actually quoted in the FACTS block
pub const MAX_FACTS_IN_PROMPT: usize = 18;
/// Facts echoed back in the response envelope
pub const MAX_FACTS_IN_RESPONSE: usize = 8;
/// A fact is one sentence of at most this many characters
pub const MAX_FACT_CHARS: usize = 260;
pub const MIN_SENTENCE_CHARS: usize = 25;
/// Encyclopedia extracts are truncated before sentence splitting
pub const MAX_EXTRACT_CHARS: usize = 12_000;
/// When no sentence passes the candidate rules, take the leading sentences
pub const FALLBACK_SENTENCE_COUNT: usize = 10;
/// Atomic-fact distillation bounds handed to the model
pub const ATOMIC_FACTS_MIN: usize = 8;
pub const ATOMIC_FACTS_MAX: usize = 14;

// Provider limits
pub const OVERPASS_ELEMENT_LIMIT: u32 = 180;
pub const WIKIDATA_PROXIMITY_LIMIT: u32 = 40;

// Story length defaults (words), overridable via BTW_MIN_WORDS / BTW_MAX_WORDS
pub const DEFAULT_MIN_STORY_WORDS: usize = 180;
pub const DEFAULT_MAX_STORY_WORDS: usize = 340;

// Timeouts (milliseconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 6_500;
pub const DEFAULT_LLM_TIMEOUT_MS: u64 = 14_000;

// Cache TTL values (milliseconds)
pub const DEFAULT_GEO_CACHE_TTL_MS: u64 = 21_600_000; // 6 hours
pub const DEFAULT_FACT_CACHE_TTL_MS: u64 = 43_200_000; // 12 hours

// In-memory cache defaults
pub const DEFAULT_MEMORY_CACHE_MAX_ENTRIES: u64 = 10_000;

// Display distances snap to this step
pub const DEFAULT_DISPLAY_DISTANCE_STEP_METERS: f64 = 50.0;

// Provider error bodies are clipped to this many bytes in logs
pub const PROVIDER_ERROR_SNIPPET_BYTES: usize = 1_536;

// The sentinel the model must emit when the FACTS block cannot carry a story
pub const NO_STORY_SENTINEL: &str = "NO_STORY";
