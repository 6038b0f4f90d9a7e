use crate::constants::*;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Optional: without it the service runs memory-only
    pub database_url: Option<String>,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_tts_model: String,
    pub openai_tts_voice: String,
    pub google_places_api_key: Option<String>,
    pub overpass_base_url: String,
    pub osm_user_agent: String,
    pub geo_cache_ttl_ms: u64,
    pub fact_cache_ttl_ms: u64,
    pub http_timeout_ms: u64,
    pub llm_timeout_ms: u64,
    pub max_candidates: usize,
    /// Optional cap on the expanding-radius ladder
    pub poi_radius_meters: Option<f64>,
    /// Optional score cutoff: candidates scoring above it stay silent
    pub min_poi_score_to_speak: Option<f64>,
    pub min_story_words: usize,
    pub max_story_words: usize,
    pub display_distance_step_m: f64,
    pub cors_allow_origins: Option<String>,
    /// Language-keyed additions to the built-in filler denylist
    pub extra_filler: HashMap<String, Vec<String>>,
    /// Language-keyed additions to the built-in sensitive denylist
    pub extra_sensitive: HashMap<String, Vec<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let min_story_words = parse_env("BTW_MIN_WORDS", DEFAULT_MIN_STORY_WORDS)?;
        let max_story_words = parse_env("BTW_MAX_WORDS", DEFAULT_MAX_STORY_WORDS)?;
        if min_story_words == 0 || min_story_words >= max_story_words {
            return Err("BTW_MIN_WORDS must be positive and below BTW_MAX_WORDS".to_string());
        }

        let display_distance_step_m: f64 = env::var("DISPLAY_DISTANCE_STEP_M")
            .unwrap_or_else(|_| DEFAULT_DISPLAY_DISTANCE_STEP_METERS.to_string())
            .parse()
            .map_err(|_| "Invalid DISPLAY_DISTANCE_STEP_M")?;
        if display_distance_step_m <= 0.0 {
            return Err("DISPLAY_DISTANCE_STEP_M must be positive".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            database_url: env::var("DATABASE_URL").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY must be set")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_tts_model: env::var("OPENAI_TTS_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini-tts".to_string()),
            openai_tts_voice: env::var("OPENAI_TTS_VOICE").unwrap_or_else(|_| "alloy".to_string()),
            google_places_api_key: env::var("GOOGLE_PLACES_API_KEY").ok(),
            overpass_base_url: env::var("OVERPASS_BASE_URL")
                .unwrap_or_else(|_| "https://overpass-api.de/api/interpreter".to_string()),
            osm_user_agent: env::var("OSM_USER_AGENT")
                .unwrap_or_else(|_| "roadtale/0.1 (contact: ops@roadtale.app)".to_string()),
            geo_cache_ttl_ms: parse_env("GEO_CACHE_TTL_MS", DEFAULT_GEO_CACHE_TTL_MS)?,
            fact_cache_ttl_ms: parse_env("FACT_CACHE_TTL_MS", DEFAULT_FACT_CACHE_TTL_MS)?,
            http_timeout_ms: parse_env("HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS)?,
            llm_timeout_ms: parse_env("LLM_TIMEOUT_MS", DEFAULT_LLM_TIMEOUT_MS)?,
            max_candidates: parse_env("POI_MAX_CANDIDATES", MAX_SCORED_CANDIDATES)?,
            poi_radius_meters: match env::var("POI_RADIUS_METERS") {
                Ok(raw) => Some(raw.parse().map_err(|_| "Invalid POI_RADIUS_METERS")?),
                Err(_) => None,
            },
            min_poi_score_to_speak: match env::var("MIN_POI_SCORE_TO_SPEAK") {
                Ok(raw) => Some(raw.parse().map_err(|_| "Invalid MIN_POI_SCORE_TO_SPEAK")?),
                Err(_) => None,
            },
            min_story_words,
            max_story_words,
            display_distance_step_m,
            cors_allow_origins: env::var("CORS_ALLOW_ORIGINS").ok(),
            extra_filler: parse_lang_lists("BANNED_FILLER")?,
            extra_sensitive: parse_lang_lists("SENSITIVE_PATTERNS")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

/// Language-keyed phrase lists come in as a JSON object, e.g.
/// `{"en": ["phrase one"], "he": ["ביטוי"]}`.
fn parse_lang_lists(name: &str) -> Result<HashMap<String, Vec<String>>, String> {
    match env::var(name) {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| format!("Invalid {}: {}", name, e)),
        Err(_) => Ok(HashMap::new()),
    }
}
