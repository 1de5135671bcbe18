// file: src/retrieval/mod.rs
// description: hybrid retrieval module exports
// reference: internal module structure

pub mod domain;
pub mod orchestrator;
pub mod scorer;

pub use domain::DomainGuard;
pub use orchestrator::RetrievalOrchestrator;
pub use scorer::HybridScorer;
