// file: src/services/memory.rs
// description: in-memory document and vector stores for tests and --memory runs
// reference: brute-force cosine similarity over stored vectors

use super::{DocumentStore, StoreStats, VectorMatch, VectorRecord, VectorStore};
use crate::error::{PipelineError, Result};
use crate::models::{Chunk, ChunkMetadata, ChunkRecord, Document, SearchFilters};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    pub async fn chunks_for(&self, doc_id: &str) -> Vec<Chunk> {
        let chunks = self.chunks.read().await;
        let mut found: Vec<Chunk> = chunks.iter().filter(|c| c.doc_id == doc_id).cloned().collect();
        found.sort_by_key(|c| c.ordinal);
        found
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_document(&self, document: &Document) -> Result<String> {
        let mut documents = self.documents.write().await;
        documents.insert(document.id.clone(), document.clone());
        Ok(document.id.clone())
    }

    async fn insert_chunks(&self, doc_id: &str, texts: &[String]) -> Result<Vec<String>> {
        if !self.documents.read().await.contains_key(doc_id) {
            return Err(PipelineError::Database(format!(
                "cannot add chunks to unknown document {}",
                doc_id
            )));
        }

        let mut chunks = self.chunks.write().await;
        chunks.retain(|c| c.doc_id != doc_id);

        let mut ids = Vec::with_capacity(texts.len());
        for (ordinal, text) in texts.iter().enumerate() {
            let chunk = Chunk::new(doc_id, ordinal as u32, text.clone());
            ids.push(chunk.id.clone());
            chunks.push(chunk);
        }
        Ok(ids)
    }

    async fn set_vector_keys(&self, pairs: &[(String, String)]) -> Result<()> {
        let keys: HashMap<&str, &str> = pairs
            .iter()
            .map(|(chunk_id, key)| (chunk_id.as_str(), key.as_str()))
            .collect();

        let mut chunks = self.chunks.write().await;
        for chunk in chunks.iter_mut() {
            if let Some(key) = keys.get(chunk.id.as_str()) {
                chunk.vector_key = Some(key.to_string());
            }
        }
        Ok(())
    }

    async fn get_chunks_by_keys(&self, keys: &[String]) -> Result<Vec<ChunkRecord>> {
        let documents = self.documents.read().await;
        let chunks = self.chunks.read().await;

        let by_key: HashMap<&str, &Chunk> = chunks
            .iter()
            .filter_map(|c| c.vector_key.as_deref().map(|k| (k, c)))
            .collect();

        Ok(keys
            .iter()
            .filter_map(|key| {
                let chunk = by_key.get(key.as_str())?;
                let doc = documents.get(&chunk.doc_id)?;
                Some(ChunkRecord {
                    chunk_id: chunk.id.clone(),
                    vector_key: key.clone(),
                    ordinal: chunk.ordinal,
                    text: chunk.text.clone(),
                    doc_id: doc.id.clone(),
                    title: doc.name.clone(),
                    path: doc.path.clone(),
                    description: doc.description.clone(),
                    source_url: doc.source_url.clone(),
                })
            })
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let chunks = self.chunks.read().await;
        Ok(StoreStats {
            documents: self.documents.read().await.len(),
            chunks: chunks.len(),
            indexed_chunks: chunks.iter().filter(|c| c.vector_key.is_some()).count(),
        })
    }

    async fn reset(&self) -> Result<()> {
        self.documents.write().await.clear();
        self.chunks.write().await.clear();
        Ok(())
    }
}

struct StoredVector {
    key: String,
    vector: Vec<f32>,
    metadata: ChunkMetadata,
}

pub struct InMemoryVectorStore {
    vectors: RwLock<Vec<StoredVector>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            vectors: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

fn metadata_field<'a>(metadata: &'a ChunkMetadata, field: &str) -> &'a str {
    match field {
        "jurisdiction" => &metadata.jurisdiction,
        "industry" => &metadata.industry,
        "doc_type" => &metadata.doc_type,
        _ => "",
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>> {
        let mut vectors = self.vectors.write().await;
        let mut keys = Vec::with_capacity(records.len());

        for record in records {
            let key = Uuid::new_v4().to_string();
            keys.push(key.clone());
            vectors.push(StoredVector {
                key,
                vector: record.vector,
                metadata: record.metadata,
            });
        }
        Ok(keys)
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorMatch>> {
        let pairs = filters.pairs();
        let vectors = self.vectors.read().await;

        let mut matches: Vec<VectorMatch> = vectors
            .iter()
            .filter(|stored| {
                pairs
                    .iter()
                    .all(|(field, value)| metadata_field(&stored.metadata, field) == *value)
            })
            .map(|stored| VectorMatch {
                key: stored.key.clone(),
                score: cosine_similarity(vector, &stored.vector) as f64,
                metadata: stored.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.vectors.read().await.len())
    }

    async fn reset(&self) -> Result<()> {
        self.vectors.write().await.clear();
        Ok(())
    }
}
