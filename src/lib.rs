// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod error;
pub mod exporter;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod retrieval;
pub mod services;
pub mod utils;

pub use config::{
    ChunkingConfig, Config, DatabaseConfig, EmbeddingConfig, ExtractionConfig, LlmConfig,
    RetrievalConfig, ScanConfig,
};
pub use database::{HashingEmbedder, LanceDbClient, OpenAiEmbeddingClient};
pub use error::{PipelineError, Result};
pub use exporter::JsonExporter;
pub use extraction::{
    DraftAssembler, ExtractionMode, ExtractionOrchestrator, ExtractionOutcome, ExtractionRequest,
    FallbackExtractor,
};
pub use llm::OpenAiChatClient;
pub use models::{
    AnalysisResult, DataFields, DraftResult, IngestMetadata, RequirementRow, SearchFilters,
    SearchResponse,
};
pub use parser::{Chunker, MetadataExtractor, SectionSplitter};
pub use pipeline::{IngestPipeline, IngestReport, RagPipeline, Services};
pub use retrieval::{HybridScorer, RetrievalOrchestrator};
pub use services::{DocumentStore, Embedder, LlmAdapter, VectorStore};
pub use utils::{HealthReport, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _chunker = Chunker::from_config(&config.chunking);
    }
}
