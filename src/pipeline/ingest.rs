// file: src/pipeline/ingest.rs
// description: chunk, store, embed and index one document
// reference: ingest with vector key back-fill

use crate::config::ChunkingConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ChunkMetadata, Document, IngestMetadata};
use crate::parser::{Chunker, MetadataExtractor};
use crate::services::{DocumentStore, Embedder, VectorRecord, VectorStore, ensure_embedding_count};
use crate::utils::validation::Validator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub chunk_count: usize,
    /// False when the document is stored but its chunks are not searchable.
    pub indexed: bool,
}

pub struct IngestPipeline {
    documents: Arc<dyn DocumentStore>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    metadata: MetadataExtractor,
}

impl IngestPipeline {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        config: &ChunkingConfig,
    ) -> Self {
        Self {
            documents,
            vector_store,
            embedder,
            chunker: Chunker::from_config(config),
            metadata: MetadataExtractor::new(),
        }
    }

    pub async fn ingest(&self, text: &str, metadata: IngestMetadata) -> Result<IngestReport> {
        Validator::validate_content_not_empty(text)?;

        let filename = metadata
            .path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .unwrap_or(metadata.title.as_str());
        let extracted = self.metadata.extract(text, filename);

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(PipelineError::Validation(format!(
                "document too short to produce a chunk of at least {} characters",
                self.chunker.min_chunk_chars()
            )));
        }

        let title = non_blank(Some(metadata.title.clone())).unwrap_or(extracted.title);
        let path = non_blank(metadata.path.clone()).unwrap_or_else(|| Document::virtual_path(&title));
        let description = non_blank(metadata.description.clone()).unwrap_or(extracted.summary);
        let chunk_metadata = ChunkMetadata {
            jurisdiction: non_blank(metadata.jurisdiction.clone())
                .or(extracted.jurisdiction)
                .unwrap_or_default(),
            industry: non_blank(metadata.industry.clone())
                .or(extracted.industry)
                .unwrap_or_default(),
            doc_type: non_blank(metadata.doc_type.clone()).unwrap_or(extracted.doc_type),
        };

        let document = Document::new(path, title, text.to_string(), description)
            .with_source_url(metadata.source_url.clone());
        let doc_id = self.documents.insert_document(&document).await?;
        let chunk_ids = self.documents.insert_chunks(&doc_id, &chunks).await?;
        debug!(doc_id = %doc_id, chunks = chunk_ids.len(), "stored document and chunks");

        let indexed = match self.index(&chunk_ids, &chunks, &chunk_metadata).await {
            Ok(()) => true,
            Err(e) => {
                warn!(doc_id = %doc_id, error = %e, "document stored but not indexed for search");
                false
            }
        };

        info!(
            doc_id = %doc_id,
            title = %document.name,
            chunks = chunks.len(),
            indexed,
            "document ingested"
        );

        Ok(IngestReport {
            doc_id,
            chunk_count: chunks.len(),
            indexed,
        })
    }

    async fn index(
        &self,
        chunk_ids: &[String],
        chunks: &[String],
        metadata: &ChunkMetadata,
    ) -> Result<()> {
        let vectors = self.embedder.embed(chunks).await?;
        ensure_embedding_count(chunks.len(), &vectors)?;

        let records: Vec<VectorRecord> = vectors
            .into_iter()
            .zip(chunks.iter())
            .map(|(vector, text)| VectorRecord {
                vector,
                text: text.clone(),
                metadata: metadata.clone(),
            })
            .collect();

        let keys = self.vector_store.insert(records).await?;
        if keys.len() != chunk_ids.len() {
            return Err(PipelineError::upstream(
                "vector store",
                format!("returned {} keys for {} chunks", keys.len(), chunk_ids.len()),
            ));
        }

        let pairs: Vec<(String, String)> = chunk_ids.iter().cloned().zip(keys).collect();
        self.documents.set_vector_keys(&pairs).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
