use crate::models::{Fact, Poi};
use serde::{Deserialize, Serialize};

// Machine-readable decision reasons
pub const REASON_OK: &str = "ok";
pub const REASON_NO_STRONG_POI: &str = "no_strong_poi";
pub const REASON_MODEL_NO_STORY: &str = "model_no_story";
pub const REASON_LOCATION_MISSING: &str = "location_missing";
pub const REASON_FINAL_VALIDATION_PREFIX: &str = "final_validation_failed_";

/// The outcome of one narration attempt. A structured value, not an error:
/// the pipeline branches on `reason`, and silence is a first-class result.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub should_speak: bool,
    pub reason: String,
    pub poi: Option<PoiWithStory>,
    pub distance_meters_approx: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoiWithStory {
    pub poi: Poi,
    pub facts: Vec<Fact>,
    pub story_text: String,
}

impl Decision {
    pub fn silent(reason: impl Into<String>) -> Self {
        Decision {
            should_speak: false,
            reason: reason.into(),
            poi: None,
            distance_meters_approx: None,
        }
    }

    pub fn silent_about(
        reason: impl Into<String>,
        poi: Poi,
        facts: Vec<Fact>,
        distance_meters_approx: f64,
    ) -> Self {
        Decision {
            should_speak: false,
            reason: reason.into(),
            poi: Some(PoiWithStory {
                poi,
                facts,
                story_text: String::new(),
            }),
            distance_meters_approx: Some(distance_meters_approx),
        }
    }

    pub fn spoken(
        poi: Poi,
        facts: Vec<Fact>,
        story_text: String,
        distance_meters_approx: f64,
    ) -> Self {
        debug_assert!(!story_text.trim().is_empty());
        debug_assert!(facts.len() >= 2);
        debug_assert!(facts.iter().any(|f| f.is_anchored()));
        Decision {
            should_speak: true,
            reason: REASON_OK.to_string(),
            poi: Some(PoiWithStory {
                poi,
                facts,
                story_text,
            }),
            distance_meters_approx: Some(distance_meters_approx),
        }
    }
}

/// Coarse taste weights used only as prompt conditioning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TasteProfile {
    pub humor: f32,
    pub nerdy: f32,
    pub dramatic: f32,
    pub shortness: f32,
}

impl Default for TasteProfile {
    fn default() -> Self {
        TasteProfile {
            humor: 0.5,
            nerdy: 0.5,
            dramatic: 0.5,
            shortness: 0.5,
        }
    }
}

impl TasteProfile {
    pub fn clamped(self) -> Self {
        TasteProfile {
            humor: self.humor.clamp(0.0, 1.0),
            nerdy: self.nerdy.clamp(0.0, 1.0),
            dramatic: self.dramatic.clamp(0.0, 1.0),
            shortness: self.shortness.clamp(0.0, 1.0),
        }
    }
}
