//! In-process caching for query embeddings
//!
//! Uses moka async cache (Send + Sync, TTL-based eviction).
//! Shared by every retrieval session, so a question asked twice
//! anywhere in the process is embedded once.

use moka::future::Cache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

/// Cache key helper: hash a string to u64
fn hash_key(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Embedding cache: hash(text) -> vector
#[derive(Clone)]
pub struct EmbeddingCache {
    embeddings: Cache<u64, Vec<f32>>,
}

impl EmbeddingCache {
    /// Create a new cache with default settings
    pub fn new() -> Self {
        Self::with_capacity(1000, Duration::from_secs(30 * 60))
    }

    /// Create a cache with explicit bounds
    pub fn with_capacity(max_entries: u64, ttl: Duration) -> Self {
        EmbeddingCache {
            embeddings: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get a cached embedding
    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.embeddings.get(&hash_key(text)).await
    }

    /// Store an embedding in cache
    pub async fn put(&self, text: &str, embedding: Vec<f32>) {
        self.embeddings.insert(hash_key(text), embedding).await;
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_cache() {
        let cache = EmbeddingCache::new();

        assert!(cache.get("hello").await.is_none());

        cache.put("hello", vec![0.1, 0.2, 0.3]).await;

        let result = cache.get("hello").await;
        assert_eq!(result, Some(vec![0.1, 0.2, 0.3]));
        assert!(cache.get("Hello").await.is_none());
    }
}
