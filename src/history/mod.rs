use crate::db;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Per-user record of POIs already narrated. Memory is authoritative;
/// Postgres, when configured, survives restarts. The first read for a user
/// hydrates the memory tier from the durable rows, later reads are
/// memory-only. Durable write failures are logged, never fatal.
pub struct HistoryStore {
    heard: RwLock<HashMap<String, HashSet<String>>>,
    pool: Option<PgPool>,
}

impl HistoryStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        HistoryStore {
            heard: RwLock::new(HashMap::new()),
            pool,
        }
    }

    /// The set of POI keys this user has already been narrated about.
    pub async fn heard_set(&self, user_key: &str) -> HashSet<String> {
        {
            let heard = self.heard.read().await;
            if let Some(set) = heard.get(user_key) {
                return set.clone();
            }
        }

        // First sight of this user: hydrate from the durable tier
        let mut hydrated = HashSet::new();
        if let Some(ref pool) = self.pool {
            match db::load_heard_set(pool, user_key).await {
                Ok(keys) => hydrated.extend(keys),
                Err(e) => {
                    tracing::warn!("History hydration failed for {}: {}", user_key, e);
                }
            }
        }

        let mut heard = self.heard.write().await;
        // A concurrent hydration may have won the race; union keeps both
        let set = heard.entry(user_key.to_string()).or_default();
        set.extend(hydrated);
        set.clone()
    }

    /// Idempotent: marking the same pair twice is a no-op in both tiers.
    pub async fn mark_heard(&self, user_key: &str, poi_key: &str) {
        {
            let mut heard = self.heard.write().await;
            heard
                .entry(user_key.to_string())
                .or_default()
                .insert(poi_key.to_string());
        }

        if let Some(ref pool) = self.pool {
            if let Err(e) = db::upsert_heard(pool, user_key, poi_key).await {
                tracing::warn!(
                    "Durable history write failed for ({}, {}): {}",
                    user_key,
                    poi_key,
                    e
                );
            }
        }
    }
}

/// Resolve the caller's user key: explicit identifier first, then the
/// forwarded client address, then the anonymous bucket.
pub fn resolve_user_key(user_id: Option<&str>, forwarded_for: Option<&str>) -> String {
    if let Some(id) = user_id {
        let id = id.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }
    if let Some(addr) = forwarded_for {
        // x-forwarded-for may carry a proxy chain; the client is leftmost
        if let Some(first) = addr.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return format!("ip:{}", first);
            }
        }
    }
    "anon".to_string()
}
