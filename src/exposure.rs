use crate::db;
use crate::models::Decision;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// One row per decision, spoken or silent.
#[derive(Debug, Clone)]
pub struct ExposureRecord {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub user_key: String,
    pub lat: f64,
    pub lng: f64,
    pub poi_key: Option<String>,
    pub poi_name: Option<String>,
    pub poi_source: Option<String>,
    pub distance_meters: Option<f64>,
    pub should_speak: bool,
    pub reason: String,
    pub taste_profile_id: Option<String>,
    pub story_len: usize,
}

/// Append-only decision log. Every decision produces a tracing line;
/// the durable insert is best-effort and never fatal.
pub struct ExposureLog {
    pool: Option<PgPool>,
}

impl ExposureLog {
    pub fn new(pool: Option<PgPool>) -> Self {
        ExposureLog { pool }
    }

    pub async fn record(
        &self,
        user_key: &str,
        lat: f64,
        lng: f64,
        taste_profile_id: Option<&str>,
        decision: &Decision,
    ) {
        let record = ExposureRecord {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            user_key: user_key.to_string(),
            lat,
            lng,
            poi_key: decision.poi.as_ref().map(|p| p.poi.key.clone()),
            poi_name: decision.poi.as_ref().map(|p| p.poi.label.clone()),
            poi_source: decision.poi.as_ref().map(|p| p.poi.source.to_string()),
            distance_meters: decision.distance_meters_approx,
            should_speak: decision.should_speak,
            reason: decision.reason.clone(),
            taste_profile_id: taste_profile_id.map(|s| s.to_string()),
            story_len: decision
                .poi
                .as_ref()
                .map(|p| p.story_text.chars().count())
                .unwrap_or(0),
        };

        tracing::info!(
            user = %record.user_key,
            poi = record.poi_key.as_deref().unwrap_or("-"),
            speak = record.should_speak,
            reason = %record.reason,
            story_len = record.story_len,
            "exposure"
        );

        if let Some(ref pool) = self.pool {
            if let Err(e) = db::insert_exposure(pool, &record).await {
                tracing::warn!("Exposure log write failed: {}", e);
            }
        }
    }
}
