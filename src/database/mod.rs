// file: src/database/mod.rs
// description: LanceDB persistence and embedding clients
// reference: internal module structure

pub mod client;
pub mod embeddings;
pub mod insert;
pub mod schema;
pub mod store;

pub use client::LanceDbClient;
pub use embeddings::{HashingEmbedder, OpenAiEmbeddingClient};
pub use insert::BatchInserter;
pub use schema::SchemaManager;
pub use store::{LanceDocumentStore, LanceVectorStore};
