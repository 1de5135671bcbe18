// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod ingest;
mod progress;
mod scanner;
mod service;

pub use ingest::{IngestPipeline, IngestReport};
pub use progress::{PipelineStats, ProgressTracker};
pub use scanner::{FileScanner, ScannedFile};
pub use service::{KbContext, RagPipeline, Services, context_query, jurisdiction_for_city};
