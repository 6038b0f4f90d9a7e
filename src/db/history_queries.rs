use sqlx::PgPool;

pub async fn load_heard_set(pool: &PgPool, user_key: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT poi_key FROM user_poi_history WHERE user_key = $1")
            .bind(user_key)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(poi_key,)| poi_key).collect())
}

/// Idempotent: replays of the same (user, poi) pair are no-ops.
pub async fn upsert_heard(
    pool: &PgPool,
    user_key: &str,
    poi_key: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_poi_history (user_key, poi_key, first_seen_at)
         VALUES ($1, $2, now())
         ON CONFLICT (user_key, poi_key) DO NOTHING",
    )
    .bind(user_key)
    .bind(poi_key)
    .execute(pool)
    .await?;
    Ok(())
}
