// file: src/retrieval/orchestrator.rs
// description: query path from domain guard through vector search to re-ranked hits
// reference: over-fetch then re-rank retrieval

use super::domain::DomainGuard;
use super::scorer::HybridScorer;
use crate::config::RetrievalConfig;
use crate::error::{PipelineError, Result};
use crate::models::{SearchFilters, SearchHit, SearchResponse};
use crate::services::{DocumentStore, Embedder, VectorStore};
use crate::utils::validation::Validator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Candidates fetched per requested hit, to leave room for re-ranking.
const OVERFETCH_FACTOR: usize = 2;

pub struct RetrievalOrchestrator {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    documents: Arc<dyn DocumentStore>,
    scorer: HybridScorer,
    guard: DomainGuard,
    snippet_chars: usize,
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        documents: Arc<dyn DocumentStore>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            documents,
            scorer: HybridScorer::from_config(config),
            guard: DomainGuard::new(),
            snippet_chars: config.snippet_chars,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<SearchResponse> {
        Validator::validate_query(query)?;

        if !self.guard.is_in_scope(query) {
            info!(query, "query is out of scope");
            return Ok(SearchResponse::out_of_scope());
        }

        let k = Validator::clamp_k(k);

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or_else(|| {
            PipelineError::upstream("embedder", "no vector returned for query")
        })?;

        let matches = self
            .vector_store
            .search(&query_vector, k * OVERFETCH_FACTOR, filters)
            .await
            .map_err(|e| match e {
                PipelineError::UpstreamUnavailable { .. } => e,
                other => PipelineError::upstream("vector store", other.to_string()),
            })?;

        debug!(candidates = matches.len(), k, "vector search returned candidates");
        if matches.is_empty() {
            return Ok(SearchResponse::in_scope(Vec::new()));
        }

        let keys: Vec<String> = matches.iter().map(|m| m.key.clone()).collect();
        let records = self.documents.get_chunks_by_keys(&keys).await?;
        let by_key: HashMap<&str, _> = records
            .iter()
            .map(|r| (r.vector_key.as_str(), r))
            .collect();

        let mut hits: Vec<SearchHit> = matches
            .iter()
            .filter_map(|m| {
                let record = by_key.get(m.key.as_str())?;
                Some(SearchHit {
                    doc_id: record.doc_id.clone(),
                    title: if record.title.is_empty() {
                        "Untitled".to_string()
                    } else {
                        record.title.clone()
                    },
                    file_path: record.path.clone(),
                    text: record.text.clone(),
                    jurisdiction: m.metadata.jurisdiction.clone(),
                    industry: m.metadata.industry.clone(),
                    doc_type: m.metadata.doc_type.clone(),
                    source_url: record.source_url.clone(),
                    vector_score: m.score,
                    lexical_score: 0.0,
                    score: 0.0,
                })
            })
            .collect();

        self.scorer.rank(query, &mut hits);
        hits.truncate(k);
        for hit in hits.iter_mut() {
            hit.text = Validator::truncate_text(&hit.text, self.snippet_chars);
        }

        info!(query, hits = hits.len(), "search complete");
        Ok(SearchResponse::in_scope(hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, Document};
    use crate::services::{InMemoryDocumentStore, InMemoryVectorStore, VectorMatch, VectorRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VOCAB: &[&str] = &["ohio", "tax", "credit", "rail", "workforce"];

    struct VocabEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for VocabEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    VOCAB
                        .iter()
                        .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            VOCAB.len()
        }
    }

    struct DownVectorStore;

    #[async_trait]
    impl VectorStore for DownVectorStore {
        async fn insert(&self, _records: Vec<VectorRecord>) -> Result<Vec<String>> {
            Err(PipelineError::Database("connection refused".to_string()))
        }

        async fn search(
            &self,
            _vector: &[f32],
            _top_k: usize,
            _filters: &SearchFilters,
        ) -> Result<Vec<VectorMatch>> {
            Err(PipelineError::Database("connection refused".to_string()))
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }

        async fn reset(&self) -> Result<()> {
            Ok(())
        }
    }

    async fn seeded(passages: &[&str]) -> (RetrievalOrchestrator, Arc<VocabEmbedder>) {
        let embedder = Arc::new(VocabEmbedder {
            calls: AtomicUsize::new(0),
        });
        let vectors = Arc::new(InMemoryVectorStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());

        let doc = Document::new(
            "/virtual/ohio".to_string(),
            "Ohio Incentives".to_string(),
            passages.join(" "),
            String::new(),
        );
        let doc_id = documents.insert_document(&doc).await.unwrap();
        let texts: Vec<String> = passages.iter().map(|p| p.to_string()).collect();
        let chunk_ids = documents.insert_chunks(&doc_id, &texts).await.unwrap();
        let embedded = embedder.embed(&texts).await.unwrap();
        let keys = vectors
            .insert(
                embedded
                    .into_iter()
                    .zip(texts.iter())
                    .map(|(vector, text)| VectorRecord {
                        vector,
                        text: text.clone(),
                        metadata: ChunkMetadata::default(),
                    })
                    .collect(),
            )
            .await
            .unwrap();
        let pairs: Vec<(String, String)> = chunk_ids.into_iter().zip(keys).collect();
        documents.set_vector_keys(&pairs).await.unwrap();
        embedder.calls.store(0, Ordering::SeqCst);

        let orchestrator = RetrievalOrchestrator::new(
            embedder.clone(),
            vectors,
            documents,
            &RetrievalConfig::default(),
        );
        (orchestrator, embedder)
    }

    #[tokio::test]
    async fn test_out_of_scope_makes_no_calls() {
        let (orchestrator, embedder) = seeded(&["ohio tax credit"]).await;
        let response = orchestrator
            .search("best pizza recipe", 5, &SearchFilters::default())
            .await
            .unwrap();

        assert!(response.out_of_scope);
        assert!(response.hits.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (orchestrator, _) = seeded(&["ohio tax credit"]).await;
        let err = orchestrator
            .search("  ", 5, &SearchFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_hits_ranked_and_truncated_to_k() {
        let (orchestrator, _) = seeded(&[
            "rail yard and workforce programs",
            "ohio tax credit for new jobs",
            "ohio rail access",
        ])
        .await;

        let response = orchestrator
            .search("ohio tax credit", 2, &SearchFilters::default())
            .await
            .unwrap();

        assert!(!response.out_of_scope);
        assert_eq!(response.hits.len(), 2);
        assert_eq!(response.hits[0].text, "ohio tax credit for new jobs");
        assert_eq!(response.hits[0].title, "Ohio Incentives");
        assert!(response.hits[0].score >= response.hits[1].score);
    }

    #[tokio::test]
    async fn test_snippet_truncated_on_char_boundary() {
        let long = format!("ohio tax credit {}", "é".repeat(1300));
        let (orchestrator, _) = seeded(&[long.as_str()]).await;

        let response = orchestrator
            .search("ohio tax credit", 1, &SearchFilters::default())
            .await
            .unwrap();

        let text = &response.hits[0].text;
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), 1203);
    }

    #[tokio::test]
    async fn test_vector_store_failure_is_upstream_unavailable() {
        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(VocabEmbedder {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(DownVectorStore),
            Arc::new(InMemoryDocumentStore::new()),
            &RetrievalConfig::default(),
        );

        let err = orchestrator
            .search("ohio tax credit", 5, &SearchFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable { .. }));
    }
}
