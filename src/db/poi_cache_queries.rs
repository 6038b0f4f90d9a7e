use crate::models::Poi;
use sqlx::PgPool;
use std::time::Duration;

/// Durable second tier behind the in-memory POI cache. Rows older than
/// `max_age` are treated as misses; the writer refreshes them in place.
pub async fn load_cached_pois(
    pool: &PgPool,
    cache_key: &str,
    max_age: Duration,
) -> Result<Option<Vec<Poi>>, sqlx::Error> {
    let row: Option<(serde_json::Value,)> = sqlx::query_as(
        "SELECT poi_json FROM poi_cache
         WHERE cache_key = $1 AND updated_at > now() - $2::interval",
    )
    .bind(cache_key)
    .bind(format!("{} seconds", max_age.as_secs()))
    .fetch_optional(pool)
    .await?;

    match row {
        Some((json,)) => match serde_json::from_value::<Vec<Poi>>(json) {
            Ok(pois) => Ok(Some(pois)),
            Err(e) => {
                tracing::warn!("Discarding undecodable poi_cache row {}: {}", cache_key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn store_cached_pois(
    pool: &PgPool,
    cache_key: &str,
    pois: &[Poi],
) -> Result<(), sqlx::Error> {
    let json = serde_json::to_value(pois)
        .map_err(|e| sqlx::Error::Protocol(format!("poi_json encode: {}", e)))?;
    sqlx::query(
        "INSERT INTO poi_cache (cache_key, poi_json, updated_at)
         VALUES ($1, $2, now())
         ON CONFLICT (cache_key) DO UPDATE
         SET poi_json = EXCLUDED.poi_json, updated_at = now()",
    )
    .bind(cache_key)
    .bind(json)
    .execute(pool)
    .await?;
    Ok(())
}
