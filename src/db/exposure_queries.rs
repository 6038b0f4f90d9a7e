use crate::exposure::ExposureRecord;
use sqlx::PgPool;

pub async fn insert_exposure(pool: &PgPool, record: &ExposureRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exposure_log
            (id, created_at, user_key, lat, lng, poi_key, poi_name, poi_source,
             distance_meters, should_speak, reason, taste_profile_id, story_len)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(record.id)
    .bind(record.created_at)
    .bind(&record.user_key)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.poi_key)
    .bind(&record.poi_name)
    .bind(&record.poi_source)
    .bind(record.distance_meters)
    .bind(record.should_speak)
    .bind(&record.reason)
    .bind(&record.taste_profile_id)
    .bind(record.story_len as i32)
    .execute(pool)
    .await?;
    Ok(())
}
