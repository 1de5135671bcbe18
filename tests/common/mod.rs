// file: tests/common/mod.rs
// description: shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use rfp_rag::config::Config;
use rfp_rag::error::{PipelineError, Result};
use rfp_rag::models::SearchFilters;
use rfp_rag::services::{
    InMemoryDocumentStore, InMemoryVectorStore, LlmAdapter, VectorMatch, VectorRecord,
    VectorStore,
};
use rfp_rag::{HashingEmbedder, RagPipeline, Services};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const EMBEDDING_DIM: usize = 64;

type Responder = dyn Fn(&str, usize) -> Result<String> + Send + Sync;

/// Llm fake answering from a closure over the user prompt and call number.
pub struct ScriptedLlm {
    respond: Box<Responder>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(respond: impl Fn(&str, usize) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a retryable upstream error.
    pub fn unavailable() -> Self {
        Self::new(|_, _| Err(PipelineError::upstream("llm", "connection refused")))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmAdapter for ScriptedLlm {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user.to_string());
        (self.respond)(user, call)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Vector store wrapper that counts searches.
pub struct CountingVectorStore {
    inner: InMemoryVectorStore,
    searches: AtomicUsize,
}

impl CountingVectorStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingVectorStore {
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>> {
        self.inner.insert(records).await
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorMatch>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(vector, top_k, filters).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn reset(&self) -> Result<()> {
        self.inner.reset().await
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default_config();
    config.embedding.dimension = EMBEDDING_DIM;
    config.extraction.single_retry_delay_ms = 0;
    config.extraction.section_retry_delay_ms = 0;
    config
}

pub fn services(
    vector_store: Arc<dyn VectorStore>,
    llm: Option<Arc<dyn LlmAdapter>>,
) -> Services {
    Services {
        documents: Arc::new(InMemoryDocumentStore::new()),
        vector_store,
        embedder: Arc::new(HashingEmbedder::new(EMBEDDING_DIM)),
        llm,
    }
}

pub fn pipeline(llm: Option<Arc<dyn LlmAdapter>>) -> (RagPipeline, Arc<CountingVectorStore>) {
    let store = Arc::new(CountingVectorStore::new());
    let pipeline = RagPipeline::new(services(store.clone(), llm), &test_config());
    (pipeline, store)
}

/// One requirement row as the model would return it.
pub fn row_json(id: usize, section: &str, status: &str, answer: Option<&str>) -> String {
    let answer = answer
        .map(|a| format!(r#""{}""#, a))
        .unwrap_or_else(|| "null".to_string());
    format!(
        r#"{{"id": "REQ-{:03}", "section": "{}", "priority": "high", "requirement_text": "{} requirement {}", "normalized_key": "{}_{}", "datatype": "number", "unit": "acres", "answer_value": {}, "status": "{}", "source_field": "features.{}_{}", "confidence": 0.8}}"#,
        id,
        section,
        section,
        id,
        section.to_lowercase(),
        id,
        answer,
        status,
        section.to_lowercase(),
        id
    )
}

pub fn response_json(rows: &[String]) -> String {
    format!(
        r#"{{"requirements_table": [{}], "summary": {{"critical_gaps": [], "data_sources_used": []}}}}"#,
        rows.join(",")
    )
}

/// An RFP of `sections` numbered sections, each about `body_chars` long.
pub fn sectioned_rfp(sections: &[&str], body_chars: usize) -> String {
    let sentence = "Respondents must document compliance. ";
    let repeats = body_chars / sentence.len() + 1;
    sections
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}\n{}\n", i + 1, name, sentence.repeat(repeats)))
        .collect()
}
