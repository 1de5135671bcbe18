// file: src/parser/mod.rs
// description: text normalization, chunking, section splitting and metadata
// reference: internal module structure

pub mod chunker;
pub mod metadata;
pub mod normalizer;
pub mod patterns;
pub mod sections;

pub use chunker::Chunker;
pub use metadata::{ExtractedMetadata, MetadataExtractor};
pub use normalizer::TextNormalizer;
pub use sections::{Section, SectionSplitter};
