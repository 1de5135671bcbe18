// file: src/database/schema.rs
// description: LanceDB table schemas for documents, chunks and vectors
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::error::Result;
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use tracing::warn;

pub struct SchemaManager<'a> {
    client: &'a LanceDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    fn table_names(&self) -> [&'a str; 3] {
        let config = self.client.config();
        [
            config.documents_table.as_str(),
            config.chunks_table.as_str(),
            config.vectors_table.as_str(),
        ]
    }

    /// True when every table has been created. Tables are created on first insert.
    pub async fn verify_schema(&self) -> Result<bool> {
        let mut complete = true;
        for table_name in self.table_names() {
            if !self.client.table_exists(table_name).await? {
                warn!("Table '{}' does not exist yet", table_name);
                complete = false;
            }
        }
        Ok(complete)
    }

    pub fn documents_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("path", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("content_hash", DataType::Utf8, false),
            Field::new("file_size", DataType::UInt64, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("source_url", DataType::Utf8, true),
            Field::new("created_at", DataType::UInt64, false),
        ]))
    }

    pub fn chunks_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("ordinal", DataType::UInt32, false),
            Field::new("text", DataType::Utf8, false),
            // Back-filled once the vector store accepts the chunk
            Field::new("vector_key", DataType::Utf8, true),
        ]))
    }

    pub fn vectors_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("key", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("jurisdiction", DataType::Utf8, false),
            Field::new("industry", DataType::Utf8, false),
            Field::new("doc_type", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }
}
