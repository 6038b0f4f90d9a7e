use crate::cache::MemoryCache;
use crate::db;
use crate::models::{Coordinates, Poi};
use crate::providers::PoiProvider;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// POI aggregation: parallel fan-out over the primary providers, a
/// commercial fallback when they both come back empty, normalization and
/// de-duplication, all behind a bucket-keyed cache.
pub struct PoiService {
    /// Primary providers in merge order (OSM before graph)
    providers: Vec<Arc<dyn PoiProvider>>,
    fallback: Option<Arc<dyn PoiProvider>>,
    cache: Arc<MemoryCache>,
    pool: Option<PgPool>,
    geo_ttl: Duration,
}

impl PoiService {
    pub fn new(
        providers: Vec<Arc<dyn PoiProvider>>,
        fallback: Option<Arc<dyn PoiProvider>>,
        cache: Arc<MemoryCache>,
        pool: Option<PgPool>,
        geo_ttl: Duration,
    ) -> Self {
        PoiService {
            providers,
            fallback,
            cache,
            pool,
            geo_ttl,
        }
    }

    /// Normalized POI set around a point. Never fails: provider errors are
    /// isolated to empty contributions.
    pub async fn nearby(&self, center: &Coordinates, radius_meters: f64, lang: &str) -> Vec<Poi> {
        let cache_key = format!("poi:{}:{}", center.bucket_key(radius_meters), lang);

        if let Some(cached) = self.cache.get_pois(&cache_key).await {
            return cached;
        }

        // Durable second tier survives restarts
        if let Some(ref pool) = self.pool {
            match db::load_cached_pois(pool, &cache_key, self.geo_ttl).await {
                Ok(Some(pois)) => {
                    self.cache.put_pois(&cache_key, &pois).await;
                    return pois;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Durable POI cache read failed: {}", e),
            }
        }

        let mut pois = self.fetch_all(center, radius_meters, lang).await;

        if pois.is_empty() {
            if let Some(ref fallback) = self.fallback {
                tracing::info!("Primary providers empty, trying {}", fallback.name());
                pois = settle(fallback.as_ref(), center, radius_meters, lang).await;
            }
        }

        let normalized = normalize(pois);

        self.cache.put_pois(&cache_key, &normalized).await;
        if let Some(ref pool) = self.pool {
            if let Err(e) = db::store_cached_pois(pool, &cache_key, &normalized).await {
                tracing::warn!("Durable POI cache write failed: {}", e);
            }
        }

        normalized
    }

    /// Settle-all fan-out: every provider runs to completion, failures
    /// contribute nothing, and the merge respects provider order so the
    /// first-occurrence-wins de-dup stays reproducible.
    async fn fetch_all(&self, center: &Coordinates, radius_meters: f64, lang: &str) -> Vec<Poi> {
        let futures: Vec<_> = self
            .providers
            .iter()
            .map(|p| settle(p.as_ref(), center, radius_meters, lang))
            .collect();

        let results = futures::future::join_all(futures).await;
        results.into_iter().flatten().collect()
    }
}

async fn settle(
    provider: &dyn PoiProvider,
    center: &Coordinates,
    radius_meters: f64,
    lang: &str,
) -> Vec<Poi> {
    match provider.fetch(center, radius_meters, lang).await {
        Ok(pois) => {
            tracing::debug!("{} returned {} POIs", provider.name(), pois.len());
            pois
        }
        Err(e) => {
            tracing::warn!("{} failed, contributing nothing: {}", provider.name(), e);
            Vec::new()
        }
    }
}

/// Drop identity-less records, then de-duplicate by lowercased label plus
/// 4-decimal coordinates, keeping the first occurrence.
pub fn normalize(pois: Vec<Poi>) -> Vec<Poi> {
    let mut seen = HashSet::new();
    pois.into_iter()
        .filter(|poi| poi.has_identity())
        .filter(|poi| seen.insert(poi.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::PoiSource;
    use async_trait::async_trait;

    struct FixedProvider {
        name: &'static str,
        pois: Vec<Poi>,
        fail: bool,
    }

    #[async_trait]
    impl PoiProvider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _: &Coordinates, _: f64, _: &str) -> Result<Vec<Poi>> {
            if self.fail {
                return Err(AppError::Provider {
                    provider: self.name,
                    message: "boom".to_string(),
                });
            }
            Ok(self.pois.clone())
        }
    }

    fn poi(source: PoiSource, id: &str, label: &str, lat: f64, lng: f64) -> Poi {
        Poi::new(
            source,
            id,
            label.to_string(),
            Coordinates::new(lat, lng).unwrap(),
        )
    }

    fn service(
        providers: Vec<Arc<dyn PoiProvider>>,
        fallback: Option<Arc<dyn PoiProvider>>,
    ) -> PoiService {
        PoiService::new(
            providers,
            fallback,
            Arc::new(MemoryCache::new(
                Duration::from_secs(60),
                Duration::from_secs(60),
            )),
            None,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_normalize_dedups_across_sources() {
        let pois = vec![
            poi(PoiSource::Osm, "1", "Big Ben", 51.5007, -0.1246),
            poi(PoiSource::Graph, "Q41225", "big ben", 51.50071, -0.12461),
            poi(PoiSource::Osm, "2", "Westminster Abbey", 51.4994, -0.1273),
        ];
        let normalized = normalize(pois);
        assert_eq!(normalized.len(), 2);
        // First occurrence wins
        assert_eq!(normalized[0].source, PoiSource::Osm);
    }

    #[tokio::test]
    async fn test_failed_provider_is_isolated() {
        let osm = Arc::new(FixedProvider {
            name: "osm",
            pois: vec![],
            fail: true,
        });
        let graph = Arc::new(FixedProvider {
            name: "graph",
            pois: vec![poi(PoiSource::Graph, "Q1", "Somewhere", 1.0, 1.0)],
            fail: false,
        });

        let service = service(vec![osm, graph], None);
        let center = Coordinates::new(1.0, 1.0).unwrap();
        let pois = service.nearby(&center, 500.0, "en").await;

        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].source, PoiSource::Graph);
    }

    #[tokio::test]
    async fn test_fallback_only_when_primaries_empty() {
        let empty = Arc::new(FixedProvider {
            name: "osm",
            pois: vec![],
            fail: false,
        });
        let places = Arc::new(FixedProvider {
            name: "places",
            pois: vec![poi(PoiSource::Places, "p1", "Cafe Corner", 1.0, 1.0)],
            fail: false,
        });

        let service = service(vec![empty], Some(places));
        let center = Coordinates::new(1.0, 1.0).unwrap();
        let pois = service.nearby(&center, 500.0, "en").await;
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].source, PoiSource::Places);
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_primaries_deliver() {
        let osm = Arc::new(FixedProvider {
            name: "osm",
            pois: vec![poi(PoiSource::Osm, "1", "Big Ben", 51.5007, -0.1246)],
            fail: false,
        });
        let places = Arc::new(FixedProvider {
            name: "places",
            pois: vec![poi(PoiSource::Places, "p1", "Cafe Corner", 1.0, 1.0)],
            fail: false,
        });

        let service = service(vec![osm], Some(places));
        let center = Coordinates::new(51.5, -0.12).unwrap();
        let pois = service.nearby(&center, 500.0, "en").await;
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].source, PoiSource::Osm);
    }

    #[tokio::test]
    async fn test_second_query_hits_cache() {
        // The provider panics on its second call; a cache hit never reaches it
        struct CountingProvider {
            calls: std::sync::atomic::AtomicUsize,
        }

        #[async_trait]
        impl PoiProvider for CountingProvider {
            fn name(&self) -> &'static str {
                "osm"
            }
            async fn fetch(&self, _: &Coordinates, _: f64, _: &str) -> Result<Vec<Poi>> {
                let n = self
                    .calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                assert_eq!(n, 0, "provider called again despite warm cache");
                Ok(vec![poi(PoiSource::Osm, "1", "Big Ben", 51.5007, -0.1246)])
            }
        }

        let provider = Arc::new(CountingProvider {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let service = service(vec![provider], None);
        let center = Coordinates::new(51.5007, -0.1246).unwrap();

        let first = service.nearby(&center, 500.0, "en").await;
        let second = service.nearby(&center, 500.0, "en").await;
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].key, second[0].key);
    }
}
