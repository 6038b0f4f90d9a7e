pub mod memory;

pub use memory::MemoryCache;

use serde::{Deserialize, Serialize};

/// Key for cached knowledge-graph fact sets
pub fn graph_facts_key(graph_id: &str, lang: &str) -> String {
    format!("facts:graph:{}:{}", graph_id, lang)
}

/// Key for cached encyclopedia fact sets
pub fn encyclopedia_facts_key(lang: &str, title: &str) -> String {
    format!("facts:wiki:{}:{}", lang, title.to_lowercase())
}

/// Cache statistics for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_keys_distinguish_language() {
        assert_ne!(graph_facts_key("Q41225", "en"), graph_facts_key("Q41225", "he"));
        assert_ne!(
            encyclopedia_facts_key("en", "Big Ben"),
            encyclopedia_facts_key("fr", "Big Ben")
        );
    }

    #[test]
    fn test_encyclopedia_key_case_folds_title() {
        assert_eq!(
            encyclopedia_facts_key("en", "Big Ben"),
            encyclopedia_facts_key("en", "big ben")
        );
    }
}
