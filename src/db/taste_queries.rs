use crate::models::TasteProfile;
use sqlx::PgPool;

pub async fn load_taste_profile(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TasteProfile>, sqlx::Error> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT data FROM taste_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((json,)) => match serde_json::from_value::<TasteProfile>(json) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                tracing::warn!("Discarding undecodable taste profile {}: {}", id, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn upsert_taste_profile(
    pool: &PgPool,
    id: &str,
    profile: &TasteProfile,
) -> Result<(), sqlx::Error> {
    let json = serde_json::to_value(profile)
        .map_err(|e| sqlx::Error::Protocol(format!("taste encode: {}", e)))?;
    sqlx::query(
        "INSERT INTO taste_profiles (id, created_at, updated_at, data)
         VALUES ($1, now(), now(), $2)
         ON CONFLICT (id) DO UPDATE
         SET data = EXCLUDED.data, updated_at = now()",
    )
    .bind(id)
    .bind(json)
    .execute(pool)
    .await?;
    Ok(())
}
