use crate::db;
use crate::models::TasteProfile;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// How far one piece of feedback moves a weight.
const FEEDBACK_STEP: f32 = 0.15;

/// Feedback signals from the client; each present flag nudges one weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasteFeedback {
    pub liked: Option<bool>,
    pub more_humor: Option<bool>,
    pub more_nerdy: Option<bool>,
    pub more_dramatic: Option<bool>,
    pub shorter: Option<bool>,
}

/// Taste profiles: memory first, durable tier best-effort. Defaults are
/// served for unknown ids.
pub struct TasteStore {
    profiles: RwLock<HashMap<String, TasteProfile>>,
    pool: Option<PgPool>,
}

impl TasteStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        TasteStore {
            profiles: RwLock::new(HashMap::new()),
            pool,
        }
    }

    pub async fn get(&self, id: &str) -> TasteProfile {
        {
            let profiles = self.profiles.read().await;
            if let Some(profile) = profiles.get(id) {
                return *profile;
            }
        }

        if let Some(ref pool) = self.pool {
            match db::load_taste_profile(pool, id).await {
                Ok(Some(profile)) => {
                    let mut profiles = self.profiles.write().await;
                    profiles.insert(id.to_string(), profile);
                    return profile;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Taste profile load failed for {}: {}", id, e),
            }
        }

        TasteProfile::default()
    }

    pub async fn set(&self, id: &str, profile: TasteProfile) -> TasteProfile {
        let profile = profile.clamped();
        self.store(id, profile).await;
        profile
    }

    pub async fn apply_feedback(&self, id: &str, feedback: &TasteFeedback) -> TasteProfile {
        let mut profile = self.get(id).await;

        if let Some(more) = feedback.more_humor {
            profile.humor += direction(more);
        }
        if let Some(more) = feedback.more_nerdy {
            profile.nerdy += direction(more);
        }
        if let Some(more) = feedback.more_dramatic {
            profile.dramatic += direction(more);
        }
        if let Some(shorter) = feedback.shorter {
            profile.shortness += direction(shorter);
        }
        // A plain like/dislike without a specific axis nudges drama, the
        // axis most correlated with engagement
        if let Some(liked) = feedback.liked {
            profile.dramatic += direction(liked) / 2.0;
        }

        let profile = profile.clamped();
        self.store(id, profile).await;
        profile
    }

    async fn store(&self, id: &str, profile: TasteProfile) {
        {
            let mut profiles = self.profiles.write().await;
            profiles.insert(id.to_string(), profile);
        }
        if let Some(ref pool) = self.pool {
            if let Err(e) = db::upsert_taste_profile(pool, id, &profile).await {
                tracing::warn!("Taste profile write failed for {}: {}", id, e);
            }
        }
    }
}

fn direction(positive: bool) -> f32 {
    if positive {
        FEEDBACK_STEP
    } else {
        -FEEDBACK_STEP
    }
}
