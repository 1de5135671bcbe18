// file: src/services/mod.rs
// description: narrow async interfaces to the embedder, llm, vector store and document store
// reference: https://docs.rs/async-trait

//! Collaborator interfaces consumed by the retrieval and extraction
//! pipelines. Every implementation must be `Send + Sync` so a single
//! `Arc<dyn Trait>` can be shared across the async call graph.

pub mod memory;

use crate::error::Result;
use crate::models::{ChunkMetadata, ChunkRecord, Document, SearchFilters};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::{InMemoryDocumentStore, InMemoryVectorStore};

/// One embedded passage handed to the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A vector store hit. `score` is a similarity where larger is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub key: String,
    pub score: f64,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub chunks: usize,
    pub indexed_chunks: usize,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store the records and return one key per record, in order.
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>>;

    /// Nearest neighbours of `vector`, restricted by exact-match filters.
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorMatch>>;

    async fn count(&self) -> Result<usize>;

    async fn reset(&self) -> Result<()>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    fn model(&self) -> &str;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: &Document) -> Result<String>;

    /// Store chunk texts with contiguous zero-based ordinals; returns chunk ids.
    async fn insert_chunks(&self, doc_id: &str, texts: &[String]) -> Result<Vec<String>>;

    /// Attach vector keys as `(chunk_id, vector_key)` pairs.
    async fn set_vector_keys(&self, pairs: &[(String, String)]) -> Result<()>;

    /// Chunks joined with their parent document. Unknown keys are skipped.
    async fn get_chunks_by_keys(&self, keys: &[String]) -> Result<Vec<ChunkRecord>>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    async fn stats(&self) -> Result<StoreStats>;

    async fn reset(&self) -> Result<()>;
}

/// Check an embedding batch against its inputs.
pub fn ensure_embedding_count(expected: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != expected {
        return Err(crate::error::PipelineError::upstream(
            "embedder",
            format!("returned {} vectors for {} texts", vectors.len(), expected),
        ));
    }
    Ok(())
}
