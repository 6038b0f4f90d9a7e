use crate::error::Result;
use crate::models::TasteProfile;
use crate::taste::TasteFeedback;
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TasteRequest {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default, rename = "tasteProfileId")]
    pub taste_profile_id: Option<String>,
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default, rename = "moreHumor")]
    pub more_humor: Option<bool>,
    #[serde(default, rename = "moreNerdy")]
    pub more_nerdy: Option<bool>,
    #[serde(default, rename = "moreDramatic")]
    pub more_dramatic: Option<bool>,
    #[serde(default)]
    pub shorter: Option<bool>,
    #[serde(default)]
    pub taste: Option<TasteProfile>,
}

impl TasteRequest {
    fn profile_id(&self) -> String {
        self.taste_profile_id
            .clone()
            .or_else(|| self.user_id.clone())
            .unwrap_or_else(|| "anon".to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct TasteResponse {
    pub id: String,
    pub taste: TasteProfile,
}

/// POST /api/taste/feedback - nudge weights from like/more-of signals
pub async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TasteRequest>,
) -> Result<Json<TasteResponse>> {
    let id = request.profile_id();
    let feedback = TasteFeedback {
        liked: request.liked,
        more_humor: request.more_humor,
        more_nerdy: request.more_nerdy,
        more_dramatic: request.more_dramatic,
        shorter: request.shorter,
    };
    let taste = state.tastes.apply_feedback(&id, &feedback).await;
    Ok(Json(TasteResponse { id, taste }))
}

/// POST /api/taste/set - replace the profile outright
pub async fn set(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TasteRequest>,
) -> Result<Json<TasteResponse>> {
    let id = request.profile_id();
    let taste = match request.taste {
        Some(profile) => state.tastes.set(&id, profile).await,
        None => state.tastes.get(&id).await,
    };
    Ok(Json(TasteResponse { id, taste }))
}
