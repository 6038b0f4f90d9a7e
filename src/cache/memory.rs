use crate::cache::CacheStats;
use crate::constants::DEFAULT_MEMORY_CACHE_MAX_ENTRIES;
use crate::models::{Fact, Poi};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Process-local TTL cache backed by moka, one tier per value shape:
/// POI lists by coordinate bucket, fact sets by graph/encyclopedia key.
/// All methods are `&self` — no locking needed.
pub struct MemoryCache {
    pois: Cache<String, Arc<Vec<Poi>>>,
    facts: Cache<String, Arc<Vec<Fact>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new(geo_ttl: Duration, fact_ttl: Duration) -> Self {
        let pois = Cache::builder()
            .time_to_live(geo_ttl)
            .max_capacity(DEFAULT_MEMORY_CACHE_MAX_ENTRIES)
            .build();
        let facts = Cache::builder()
            .time_to_live(fact_ttl)
            .max_capacity(DEFAULT_MEMORY_CACHE_MAX_ENTRIES)
            .build();

        MemoryCache {
            pois,
            facts,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get_pois(&self, key: &str) -> Option<Vec<Poi>> {
        match self.pois.get(key).await {
            Some(arc_pois) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("POI cache hit: {}", key);
                Some((*arc_pois).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("POI cache miss: {}", key);
                None
            }
        }
    }

    pub async fn put_pois(&self, key: &str, pois: &[Poi]) {
        self.pois
            .insert(key.to_string(), Arc::new(pois.to_vec()))
            .await;
    }

    pub async fn get_facts(&self, key: &str) -> Option<Vec<Fact>> {
        match self.facts.get(key).await {
            Some(arc_facts) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some((*arc_facts).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn put_facts(&self, key: &str, facts: &[Fact]) {
        self.facts
            .insert(key.to_string(), Arc::new(facts.to_vec()))
            .await;
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PoiSource};

    fn make_poi(name: &str) -> Poi {
        Poi::new(
            PoiSource::Osm,
            name,
            name.to_string(),
            Coordinates::new(51.5, -0.12).unwrap(),
        )
    }

    #[tokio::test]
    async fn cache_miss() {
        let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_secs(60));
        assert!(cache.get_pois("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn poi_roundtrip() {
        let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_secs(60));
        let pois = vec![make_poi("a"), make_poi("b")];

        cache.put_pois("bucket", &pois).await;
        let cached = cache.get_pois("bucket").await.unwrap();

        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].label, "a");
    }

    #[tokio::test]
    async fn fact_roundtrip() {
        let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_secs(60));
        let facts = vec![Fact::from_sentence("Built in 1859").unwrap()];

        cache.put_facts("facts:graph:Q1:en", &facts).await;
        let cached = cache.get_facts("facts:graph:Q1:en").await.unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached[0].has_year);
    }

    #[tokio::test]
    async fn stats_tracking() {
        let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_secs(60));
        cache.put_pois("k", &[make_poi("a")]).await;

        cache.get_pois("missing").await;
        cache.get_pois("k").await;
        cache.get_pois("k").await;

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 66.666).abs() < 1.0);
    }

    #[tokio::test]
    async fn ttl_expiry() {
        let cache = MemoryCache::new(Duration::from_millis(50), Duration::from_secs(60));
        cache.put_pois("k", &[make_poi("a")]).await;
        assert!(cache.get_pois("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get_pois("k").await.is_none());
    }
}
