// file: src/database/insert.rs
// description: arrow record batch builders and LanceDB append operations
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::database::schema::SchemaManager;
use crate::error::{PipelineError, Result};
use crate::models::{Chunk, Document};
use crate::services::VectorRecord;
use arrow_array::{
    FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array,
    UInt64Array,
};
use arrow_schema::Schema;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BatchInserter<'a> {
    client: &'a LanceDbClient,
}

impl<'a> BatchInserter<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    /// Append a batch, creating the table from it on first use.
    pub async fn append(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
        batch: RecordBatch,
    ) -> Result<usize> {
        let rows = batch.num_rows();
        if rows == 0 {
            return Ok(0);
        }

        if !self.client.table_exists(table_name).await? {
            self.client
                .get_connection()
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| {
                    PipelineError::Database(format!("Failed to create table {}: {}", table_name, e))
                })?;
            info!("Created new table: {}", table_name);
        } else {
            let table = self.client.get_table(table_name).await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                .execute()
                .await
                .map_err(|e| {
                    PipelineError::Database(format!("Failed to insert into {}: {}", table_name, e))
                })?;
        }

        debug!("Appended {} rows to {}", rows, table_name);
        Ok(rows)
    }

    pub fn document_batch(documents: &[Document]) -> Result<RecordBatch> {
        let ids: StringArray = documents.iter().map(|d| Some(d.id.as_str())).collect();
        let paths: StringArray = documents.iter().map(|d| Some(d.path.as_str())).collect();
        let names: StringArray = documents.iter().map(|d| Some(d.name.as_str())).collect();
        let texts: StringArray = documents.iter().map(|d| Some(d.text.as_str())).collect();
        let hashes: StringArray = documents
            .iter()
            .map(|d| Some(d.content_hash.as_str()))
            .collect();
        let sizes: UInt64Array = documents.iter().map(|d| Some(d.file_size)).collect();
        let descriptions: StringArray = documents
            .iter()
            .map(|d| Some(d.description.as_str()))
            .collect();
        let source_urls: StringArray = documents.iter().map(|d| d.source_url.as_deref()).collect();
        let created: UInt64Array = documents.iter().map(|d| Some(d.created_at)).collect();

        RecordBatch::try_new(
            SchemaManager::documents_schema(),
            vec![
                Arc::new(ids),
                Arc::new(paths),
                Arc::new(names),
                Arc::new(texts),
                Arc::new(hashes),
                Arc::new(sizes),
                Arc::new(descriptions),
                Arc::new(source_urls),
                Arc::new(created),
            ],
        )
        .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
    }

    pub fn chunk_batch(chunks: &[Chunk]) -> Result<RecordBatch> {
        let ids: StringArray = chunks.iter().map(|c| Some(c.id.as_str())).collect();
        let doc_ids: StringArray = chunks.iter().map(|c| Some(c.doc_id.as_str())).collect();
        let ordinals: UInt32Array = chunks.iter().map(|c| Some(c.ordinal)).collect();
        let texts: StringArray = chunks.iter().map(|c| Some(c.text.as_str())).collect();
        let keys: StringArray = chunks.iter().map(|c| c.vector_key.as_deref()).collect();

        RecordBatch::try_new(
            SchemaManager::chunks_schema(),
            vec![
                Arc::new(ids),
                Arc::new(doc_ids),
                Arc::new(ordinals),
                Arc::new(texts),
                Arc::new(keys),
            ],
        )
        .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Vector rows; every embedding must have `dimension` entries.
    pub fn vector_batch(
        records: &[VectorRecord],
        keys: &[String],
        dimension: usize,
    ) -> Result<RecordBatch> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != dimension) {
            return Err(PipelineError::Database(format!(
                "Embedding has dimension {}, expected {}",
                bad.vector.len(),
                dimension
            )));
        }

        let key_array: StringArray = keys.iter().map(|k| Some(k.as_str())).collect();
        let texts: StringArray = records.iter().map(|r| Some(r.text.as_str())).collect();
        let jurisdictions: StringArray = records
            .iter()
            .map(|r| Some(r.metadata.jurisdiction.as_str()))
            .collect();
        let industries: StringArray = records
            .iter()
            .map(|r| Some(r.metadata.industry.as_str()))
            .collect();
        let doc_types: StringArray = records
            .iter()
            .map(|r| Some(r.metadata.doc_type.as_str()))
            .collect();

        let values: Float32Array = records
            .iter()
            .flat_map(|r| r.vector.iter().copied())
            .collect();
        let vectors = FixedSizeListArray::try_new(
            Arc::new(arrow_schema::Field::new("item", arrow_schema::DataType::Float32, true)),
            dimension as i32,
            Arc::new(values),
            None,
        )
        .map_err(|e| PipelineError::Database(format!("Failed to create embedding array: {}", e)))?;

        RecordBatch::try_new(
            SchemaManager::vectors_schema(dimension),
            vec![
                Arc::new(key_array),
                Arc::new(texts),
                Arc::new(jurisdictions),
                Arc::new(industries),
                Arc::new(doc_types),
                Arc::new(vectors),
            ],
        )
        .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;
    use arrow_array::Array;

    #[test]
    fn test_chunk_batch_keeps_missing_keys_null() {
        let chunks = vec![Chunk::new("doc", 0, "alpha".to_string()), {
            let mut c = Chunk::new("doc", 1, "beta".to_string());
            c.vector_key = Some("k1".to_string());
            c
        }];
        let batch = BatchInserter::chunk_batch(&chunks).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column_by_name("vector_key").unwrap().null_count(), 1);
    }

    #[test]
    fn test_vector_batch_rejects_wrong_dimension() {
        let records = vec![VectorRecord {
            vector: vec![0.1, 0.2],
            text: "t".to_string(),
            metadata: ChunkMetadata::default(),
        }];
        let err = BatchInserter::vector_batch(&records, &["k".to_string()], 3).unwrap_err();
        assert!(matches!(err, PipelineError::Database(_)));
        assert!(BatchInserter::vector_batch(&records, &["k".to_string()], 2).is_ok());
    }
}
