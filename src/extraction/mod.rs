// file: src/extraction/mod.rs
// description: requirement extraction module exports
// reference: rust module system

pub mod draft;
pub mod fallback;
pub mod orchestrator;
pub mod patterns;
pub mod prompt;
pub mod schema;

pub use draft::{DRAFT_TITLE, DraftAssembler};
pub use fallback::FallbackExtractor;
pub use orchestrator::{
    ExtractionMode, ExtractionOrchestrator, ExtractionOutcome, ExtractionRequest, MergeState,
    SectionFailure, UnitOutcome, fold_sections,
};
pub use prompt::{ExtractionAction, Prompt};
pub use schema::{ParsedResponse, parse_response};
