//! Query embedding via the completion service
//!
//! Document chunks arrive pre-embedded in the index; only user questions
//! are embedded at runtime, through the remote embeddings endpoint.

use super::cache::EmbeddingCache;
use crate::agent::CompletionClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

/// Anything that can turn a query into a vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder backed by the remote embeddings API with a shared cache
#[derive(Clone)]
pub struct RemoteEmbedder {
    client: CompletionClient,
    cache: EmbeddingCache,
}

impl RemoteEmbedder {
    /// Create a new embedder
    pub fn new(client: CompletionClient, cache: EmbeddingCache) -> Self {
        RemoteEmbedder { client, cache }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text).await {
            debug!("Embedding cache hit");
            return Ok(cached);
        }

        let embedding = self
            .client
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UpstreamMalformedResponse("No embedding returned".into()))?;

        self.cache.put(text, embedding.clone()).await;
        Ok(embedding)
    }
}
