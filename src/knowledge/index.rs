//! Read-only vector index over pre-embedded document chunks
//!
//! The index is built elsewhere and shipped as a JSON file:
//!
//! ```json
//! {
//!   "model": "text-embedding-ada-002",
//!   "chunks": [
//!     { "id": "guide-0", "source": "guide.pdf", "text": "...", "embedding": [0.01, ...] }
//!   ]
//! }
//! ```
//!
//! It is loaded once at startup and never mutated afterwards, so a single
//! `Arc<DocumentIndex>` is handed to every session.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A chunk of a source document with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk identifier
    pub id: String,
    /// Document the chunk was cut from
    #[serde(default)]
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// On-disk layout of the index file
#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    model: Option<String>,
    chunks: Vec<DocumentChunk>,
}

/// A search hit
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    /// The matching chunk
    pub chunk: &'a DocumentChunk,
    /// Cosine similarity with the query
    pub score: f32,
}

/// Immutable in-memory vector index
#[derive(Debug)]
pub struct DocumentIndex {
    model: Option<String>,
    chunks: Vec<DocumentChunk>,
    norms: Vec<f32>,
    dimensions: usize,
}

impl DocumentIndex {
    /// Build an index from chunks. All embeddings must share one dimension.
    pub fn from_chunks(chunks: Vec<DocumentChunk>, model: Option<String>) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(Error::Index(format!(
                "chunk {} has {} dimensions, expected {}",
                bad.id,
                bad.embedding.len(),
                dimensions
            )));
        }

        let norms = chunks.iter().map(|c| norm(&c.embedding)).collect();

        Ok(DocumentIndex {
            model,
            chunks,
            norms,
            dimensions,
        })
    }

    /// Load an index file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Index(format!("Failed to read index {}: {}", path.display(), e))
        })?;
        let file: IndexFile = serde_json::from_str(&content).map_err(|e| {
            Error::Index(format!("Invalid index {}: {}", path.display(), e))
        })?;

        let index = Self::from_chunks(file.chunks, file.model)?;
        info!(
            "Loaded document index {}: {} chunks, {} dimensions",
            path.display(),
            index.len(),
            index.dimensions()
        );
        Ok(index)
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index has no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embedding model the chunks were built with, if recorded
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Return up to `top_k` chunks most similar to `query`, best first,
    /// skipping any scoring below `min_score`
    pub fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Result<Vec<ScoredChunk<'_>>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(Error::Index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.norms)
            .filter(|(_, n)| **n > 0.0)
            .map(|(chunk, n)| ScoredChunk {
                chunk,
                score: dot(query, &chunk.embedding) / (query_norm * n),
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            source: "test.md".to_string(),
            text: format!("text of {}", id),
            embedding,
        }
    }

    fn sample_index() -> DocumentIndex {
        DocumentIndex::from_chunks(
            vec![
                chunk("x", vec![1.0, 0.0]),
                chunk("y", vec![0.0, 1.0]),
                chunk("xy", vec![1.0, 1.0]),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.1], 2, 0.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "x");
        assert_eq!(hits[1].chunk.id, "xy");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_min_score_filters() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.0], 3, 0.9).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "x");
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(index.search(&[1.0, 0.0, 0.0], 1, 0.0), Err(Error::Index(_))));

        let mixed = DocumentIndex::from_chunks(
            vec![chunk("a", vec![1.0]), chunk("b", vec![1.0, 2.0])],
            None,
        );
        assert!(mixed.is_err());
    }

    #[test]
    fn test_empty_index() {
        let index = DocumentIndex::from_chunks(Vec::new(), None).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 3, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(
            &path,
            r#"{
                "model": "text-embedding-ada-002",
                "chunks": [
                    { "id": "a", "source": "a.md", "text": "alpha", "embedding": [1.0, 0.0] },
                    { "id": "b", "text": "beta", "embedding": [0.0, 1.0] }
                ]
            }"#,
        )
        .unwrap();

        let index = DocumentIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), 2);
        assert_eq!(index.model(), Some("text-embedding-ada-002"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DocumentIndex::load("/nonexistent/index.json"),
            Err(Error::Index(_))
        ));
    }
}
