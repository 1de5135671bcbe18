// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod draft;
pub mod requirement;
pub mod search_result;

pub use document::{Chunk, ChunkMetadata, ChunkRecord, Document, IngestMetadata};
pub use draft::{AppendixMetric, Citation, DraftMethod, DraftResult, DraftSection};
pub use requirement::{
    AnalysisMethod, AnalysisResult, AnalysisSummary, DataFields, Datatype, Priority,
    RequirementLogic, RequirementRow, RequirementStatus, field_text, requirement_id,
    value_text,
};
pub use search_result::{SearchFilters, SearchHit, SearchResponse};
