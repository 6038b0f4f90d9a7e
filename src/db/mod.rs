use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

mod exposure_queries;
mod history_queries;
mod poi_cache_queries;
mod taste_queries;

pub use exposure_queries::insert_exposure;
pub use history_queries::{load_heard_set, upsert_heard};
pub use poi_cache_queries::{load_cached_pois, store_cached_pois};
pub use taste_queries::{load_taste_profile, upsert_taste_profile};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}
