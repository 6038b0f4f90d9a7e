use crate::error::{AppError, Result};
use crate::history::resolve_user_key;
use crate::models::decision::REASON_LOCATION_MISSING;
use crate::models::{Coordinates, Decision};
use crate::story::lexicon::normalize_lang;
use crate::tts::AudioClip;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Request body for POST /api/story-both. Clients spell the coordinate
/// and language fields several ways; unknown fields (including the legacy
/// `prompt`) are ignored.
#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    #[serde(default, alias = "latitude", alias = "Latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", alias = "longitude", alias = "Longitude")]
    pub lng: Option<f64>,
    #[serde(default, alias = "language", alias = "locale", alias = "speechLang")]
    pub lang: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default, rename = "tasteProfileId")]
    pub taste_profile_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub should_speak: bool,
    pub reason: String,
    pub poi: Option<PoiEnvelope>,
    pub facts: Vec<String>,
    pub text: String,
    pub story_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioEnvelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters_approx: Option<f64>,
    pub lang: String,
    pub version: String,
    pub timing_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct PoiEnvelope {
    pub key: String,
    pub source: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set when the POI came from the curated anchor source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEnvelope {
    pub content_type: String,
    pub base64: String,
    pub bytes: usize,
}

/// POST /api/story-both
/// Decide, narrate and synthesize in one round trip. Always 200 once the
/// pipeline ran, spoken or silent; non-200 only for transport and input
/// errors.
pub async fn story_both(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<StoryRequest>,
) -> Result<Json<StoryResponse>> {
    let started = Instant::now();

    let origin = match (request.lat, request.lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
            .map_err(|_| AppError::InvalidRequest(REASON_LOCATION_MISSING.to_string()))?,
        _ => return Err(AppError::InvalidRequest(REASON_LOCATION_MISSING.to_string())),
    };

    let lang = normalize_lang(request.lang.as_deref().unwrap_or("en"));

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let user_key = resolve_user_key(request.user_id.as_deref(), forwarded);

    let taste_id = request
        .taste_profile_id
        .as_deref()
        .or(request.user_id.as_deref());
    let taste = match taste_id {
        Some(id) => state.tastes.get(id).await,
        None => Default::default(),
    };

    tracing::info!(
        "Story request: ({:.4}, {:.4}), lang={}, user={}",
        origin.lat,
        origin.lng,
        lang,
        user_key
    );

    let narration = state
        .narrator
        .narrate(origin, &user_key, &lang, &taste, taste_id)
        .await?;

    Ok(Json(build_response(
        narration.decision,
        narration.audio,
        lang,
        started.elapsed().as_millis() as u64,
    )))
}

fn build_response(
    decision: Decision,
    audio: Option<AudioClip>,
    lang: String,
    timing_ms: u64,
) -> StoryResponse {
    let poi = decision.poi.as_ref().map(|p| PoiEnvelope {
        key: p.poi.key.clone(),
        source: p.poi.source.to_string(),
        label: p.poi.label.clone(),
        description: p.poi.raw_tags.get("description").cloned(),
        anchor: matches!(p.poi.source, crate::models::PoiSource::Anchor).then_some(true),
    });
    let facts = decision
        .poi
        .as_ref()
        .map(|p| p.facts.iter().map(|f| f.text.clone()).collect())
        .unwrap_or_default();
    let story_text = decision
        .poi
        .as_ref()
        .map(|p| p.story_text.clone())
        .unwrap_or_default();

    let (audio_base64, audio_content_type, audio_envelope) = match audio {
        Some(clip) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&clip.bytes);
            (
                Some(encoded.clone()),
                Some(clip.content_type.clone()),
                Some(AudioEnvelope {
                    content_type: clip.content_type,
                    base64: encoded,
                    bytes: clip.bytes.len(),
                }),
            )
        }
        None => (None, None, None),
    };

    StoryResponse {
        should_speak: decision.should_speak,
        reason: decision.reason,
        poi,
        facts,
        text: story_text.clone(),
        story_text,
        audio_base64,
        audio_content_type,
        audio: audio_envelope,
        distance_meters_approx: decision.distance_meters_approx,
        lang,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timing_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_field_aliases() {
        let json = serde_json::json!({
            "Latitude": 51.5007,
            "longitude": -0.1246,
            "speechLang": "EN-GB",
            "userId": "u1",
            "prompt": "ignored legacy field"
        });
        let request: StoryRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.lat, Some(51.5007));
        assert_eq!(request.lng, Some(-0.1246));
        assert_eq!(request.lang.as_deref(), Some("EN-GB"));
        assert_eq!(request.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_request_missing_coordinates() {
        let json = serde_json::json!({"lang": "en"});
        let request: StoryRequest = serde_json::from_value(json).unwrap();
        assert!(request.lat.is_none());
        assert!(request.lng.is_none());
    }

    #[test]
    fn test_silent_response_shape() {
        let response = build_response(Decision::silent("no_strong_poi"), None, "en".into(), 12);
        assert!(!response.should_speak);
        assert_eq!(response.reason, "no_strong_poi");
        assert!(response.poi.is_none());
        assert!(response.facts.is_empty());
        assert_eq!(response.text, "");
        assert!(response.audio.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["shouldSpeak"], false);
        assert!(json.get("audioBase64").is_none());
        assert_eq!(json["timingMs"], 12);
    }

    #[test]
    fn test_spoken_response_carries_audio_and_text_twice() {
        use crate::models::{Fact, Poi, PoiSource};

        let poi = Poi::new(
            PoiSource::Graph,
            "Q41225",
            "Big Ben".to_string(),
            Coordinates::new(51.5007, -0.1246).unwrap(),
        );
        let facts = vec![
            Fact::from_sentence("Completed in 1859").unwrap(),
            Fact::from_sentence("The tower is 96 metres tall").unwrap(),
        ];
        let decision = Decision::spoken(poi, facts, "A grounded story.".to_string(), 450.0);
        let audio = AudioClip {
            bytes: vec![1, 2, 3],
            content_type: "audio/mpeg".to_string(),
        };

        let response = build_response(decision, Some(audio), "en".into(), 99);
        assert!(response.should_speak);
        assert_eq!(response.text, response.story_text);
        assert_eq!(response.audio.as_ref().unwrap().bytes, 3);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["poi"]["source"], "graph");
        assert_eq!(json["audio"]["contentType"], "audio/mpeg");
        assert_eq!(json["distanceMetersApprox"], 450.0);
    }
}
