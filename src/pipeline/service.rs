// file: src/pipeline/service.rs
// description: dependency-injected services and the ingest/search/analyze/draft facade
// reference: service objects wired once at startup

use super::ingest::{IngestPipeline, IngestReport};
use crate::config::Config;
use crate::database::{
    HashingEmbedder, LanceDbClient, LanceDocumentStore, LanceVectorStore, OpenAiEmbeddingClient,
};
use crate::error::Result;
use crate::extraction::{
    DRAFT_TITLE, DraftAssembler, ExtractionAction, ExtractionOrchestrator, ExtractionOutcome,
    ExtractionRequest,
};
use crate::llm::OpenAiChatClient;
use crate::models::{
    AnalysisMethod, AnalysisResult, Citation, DataFields, DraftMethod, DraftResult, IngestMetadata,
    SearchFilters, SearchResponse, field_text,
};
use crate::retrieval::RetrievalOrchestrator;
use crate::services::{
    DocumentStore, Embedder, InMemoryDocumentStore, InMemoryVectorStore, LlmAdapter, StoreStats,
    VectorStore,
};
use crate::utils::validation::Validator;
use std::sync::Arc;
use tracing::{info, warn};

const CONTEXT_K: usize = 5;
const EXCERPT_CHARS: usize = 200;
const ANALYZE_INDUSTRY: &str = "economic development";

/// City names resolved to the `City, ST` jurisdiction stored with chunks.
const CITY_JURISDICTIONS: &[(&str, &str)] = &[
    ("columbus", "Columbus, OH"),
    ("cleveland", "Cleveland, OH"),
    ("cincinnati", "Cincinnati, OH"),
    ("new york", "New York, NY"),
    ("los angeles", "Los Angeles, CA"),
    ("chicago", "Chicago, IL"),
];

/// Collaborators shared by every pipeline operation.
#[derive(Clone)]
pub struct Services {
    pub documents: Arc<dyn DocumentStore>,
    pub vector_store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Option<Arc<dyn LlmAdapter>>,
}

impl Services {
    /// LanceDB-backed stores with the configured api clients.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = LanceDbClient::new(config.database.clone()).await?;
        Ok(Self {
            documents: Arc::new(LanceDocumentStore::new(client.clone())),
            vector_store: Arc::new(LanceVectorStore::new(client, config.embedding.dimension)),
            embedder: embedder_from_config(config),
            llm: llm_from_config(config)?,
        })
    }

    /// Process-local stores with the configured api clients.
    pub fn in_memory(config: &Config) -> Result<Self> {
        Ok(Self {
            documents: Arc::new(InMemoryDocumentStore::new()),
            vector_store: Arc::new(InMemoryVectorStore::new()),
            embedder: embedder_from_config(config),
            llm: llm_from_config(config)?,
        })
    }
}

fn embedder_from_config(config: &Config) -> Arc<dyn Embedder> {
    match OpenAiEmbeddingClient::from_config(&config.embedding) {
        Some(client) => {
            info!(model = %config.embedding.model, "using embedding api");
            Arc::new(client)
        }
        None => {
            warn!("no embedding api key configured, using offline hashing embeddings");
            Arc::new(HashingEmbedder::new(config.embedding.dimension))
        }
    }
}

fn llm_from_config(config: &Config) -> Result<Option<Arc<dyn LlmAdapter>>> {
    let client = OpenAiChatClient::from_config(&config.llm)?;
    if client.is_none() {
        warn!("no llm api key configured, analysis will use regex extraction");
    }
    Ok(client.map(|c| Arc::new(c) as Arc<dyn LlmAdapter>))
}

/// Retrieved knowledge base passages for a prompt.
#[derive(Debug, Clone, Default)]
pub struct KbContext {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl KbContext {
    pub fn is_used(&self) -> bool {
        !self.text.is_empty()
    }
}

pub struct RagPipeline {
    services: Services,
    ingest: IngestPipeline,
    retrieval: RetrievalOrchestrator,
    extraction: ExtractionOrchestrator,
    drafts: DraftAssembler,
    default_k: usize,
}

impl RagPipeline {
    pub fn new(services: Services, config: &Config) -> Self {
        let ingest = IngestPipeline::new(
            services.documents.clone(),
            services.vector_store.clone(),
            services.embedder.clone(),
            &config.chunking,
        );
        let retrieval = RetrievalOrchestrator::new(
            services.embedder.clone(),
            services.vector_store.clone(),
            services.documents.clone(),
            &config.retrieval,
        );
        let extraction = ExtractionOrchestrator::new(services.llm.clone(), &config.extraction);

        Self {
            services,
            ingest,
            retrieval,
            extraction,
            drafts: DraftAssembler::new(),
            default_k: config.retrieval.default_k,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub async fn ingest(&self, text: &str, metadata: IngestMetadata) -> Result<IngestReport> {
        self.ingest.ingest(text, metadata).await
    }

    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<SearchResponse> {
        self.retrieval.search(query, k, filters).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.services.documents.stats().await
    }

    pub async fn reset(&self) -> Result<()> {
        self.services.documents.reset().await?;
        self.services.vector_store.reset().await
    }

    pub async fn analyze(&self, text: &str, fields: &DataFields) -> Result<AnalysisResult> {
        Ok(self.analyze_detailed(text, fields).await?.result)
    }

    /// Analysis with the extraction mode and any skipped sections.
    pub async fn analyze_detailed(
        &self,
        text: &str,
        fields: &DataFields,
    ) -> Result<ExtractionOutcome> {
        Validator::validate_content_not_empty(text)?;

        let city = field_text(fields, "city");
        let context = self
            .kb_context(text, city.as_deref(), Some(ANALYZE_INDUSTRY), false)
            .await;

        let outcome = self
            .extraction
            .extract(ExtractionRequest {
                text,
                fields,
                action: ExtractionAction::Analyze,
                kb_context: &context.text,
            })
            .await;

        info!(
            requirements = outcome.result.requirements.len(),
            mode = ?outcome.mode,
            kb_context_used = context.is_used(),
            "analysis finished"
        );
        Ok(outcome)
    }

    pub async fn draft(
        &self,
        text: &str,
        fields: &DataFields,
        city: Option<&str>,
        industry: Option<&str>,
    ) -> Result<DraftResult> {
        Validator::validate_content_not_empty(text)?;

        let city = city
            .map(str::to_string)
            .or_else(|| field_text(fields, "city"));
        let context = self.kb_context(text, city.as_deref(), industry, true).await;
        let kb_context_used = context.is_used();

        let outcome = self
            .extraction
            .extract(ExtractionRequest {
                text,
                fields,
                action: ExtractionAction::Draft,
                kb_context: &context.text,
            })
            .await;

        if outcome.result.method == AnalysisMethod::Regex {
            info!("using deterministic draft after regex extraction");
            return Ok(self.drafts.deterministic(
                fields,
                city.as_deref(),
                industry,
                context.citations,
                kb_context_used,
            ));
        }

        let assembled = self.drafts.from_requirements(
            &outcome.result.requirements,
            context.citations.clone(),
            kb_context_used,
        );

        let draft = match outcome.llm_draft {
            Some(sections) => DraftResult {
                title: DRAFT_TITLE.to_string(),
                sections,
                appendix_metrics: assembled.map(|d| d.appendix_metrics).unwrap_or_default(),
                citations: context.citations,
                method: DraftMethod::Llm,
                kb_context_used,
            },
            None => assembled.unwrap_or_else(|| {
                self.drafts.deterministic(
                    fields,
                    city.as_deref(),
                    industry,
                    context.citations,
                    kb_context_used,
                )
            }),
        };

        info!(
            sections = draft.sections.len(),
            method = ?draft.method,
            kb_context_used,
            "draft finished"
        );
        Ok(draft)
    }

    /// Knowledge base passages for a prompt. Failures yield empty context.
    pub async fn kb_context(
        &self,
        text: &str,
        city: Option<&str>,
        industry: Option<&str>,
        filter_industry: bool,
    ) -> KbContext {
        let query = context_query(text, city, industry);
        let filters = SearchFilters {
            jurisdiction: city.and_then(jurisdiction_for_city),
            industry: industry
                .filter(|_| filter_industry)
                .filter(|i| !i.trim().is_empty())
                .map(str::to_string),
            doc_type: None,
        };

        let response = match self.retrieval.search(&query, CONTEXT_K, &filters).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "knowledge base search failed, continuing without context");
                return KbContext::default();
            }
        };

        if response.out_of_scope || response.hits.is_empty() {
            info!(query = %query, "no relevant knowledge base results");
            return KbContext::default();
        }

        let parts: Vec<String> = response
            .hits
            .iter()
            .map(|hit| format!("Source: {}\n{}\n", hit.title, hit.text))
            .collect();
        let citations = response
            .hits
            .iter()
            .map(|hit| Citation {
                title: hit.title.clone(),
                file_path: hit.file_path.clone(),
                source_url: hit.source_url.clone(),
                excerpt: Validator::truncate_text(&hit.text, EXCERPT_CHARS),
            })
            .collect::<Vec<_>>();

        info!(sources = citations.len(), "found knowledge base context");
        KbContext {
            text: parts.join("\n---\n"),
            citations,
        }
    }
}

/// Search terms for context retrieval: industry, city, then RFP topics.
pub fn context_query(text: &str, city: Option<&str>, industry: Option<&str>) -> String {
    let industry = industry.map(str::trim).filter(|i| !i.is_empty());
    let city = city.map(str::trim).filter(|c| !c.is_empty());

    let mut terms: Vec<&str> = industry.into_iter().chain(city).collect();

    let lower = text.to_lowercase();
    let topics: [(&[&str], &str); 4] = [
        (&["incentive", "tax"], "incentives"),
        (&["workforce", "employment"], "workforce"),
        (&["infrastructure", "transport"], "infrastructure"),
        (&["power", "utility"], "infrastructure utilities"),
    ];
    for (triggers, term) in topics {
        if triggers.iter().any(|t| lower.contains(t)) {
            terms.push(term);
        }
    }

    if terms.is_empty() {
        format!("{} economic development", industry.unwrap_or("")).trim().to_string()
    } else {
        terms.join(" ")
    }
}

/// `City, ST` strings pass through; known city names are mapped.
pub fn jurisdiction_for_city(city: &str) -> Option<String> {
    let city = city.trim();
    if city.is_empty() {
        return None;
    }
    if city.contains(',') {
        return Some(city.to_string());
    }
    let key = city.to_lowercase();
    CITY_JURISDICTIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, jurisdiction)| jurisdiction.to_string())
}
