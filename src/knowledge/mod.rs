//! Knowledge module - document index, query embeddings, and caching
//!
//! Backs the retrieval-augmented answer profile with an immutable
//! in-memory vector index, a remote query embedder, and an in-process
//! embedding cache (moka).

pub mod cache;
pub mod embedding;
pub mod index;

pub use cache::EmbeddingCache;
pub use embedding::{Embedder, RemoteEmbedder};
pub use index::{DocumentChunk, DocumentIndex, ScoredChunk};
