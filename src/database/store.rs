// file: src/database/store.rs
// description: LanceDB-backed document and vector stores
// reference: https://docs.rs/lancedb

use crate::database::client::{
    LanceDbClient, in_filter, optional_value, sql_literal, string_column, u32_column, u64_column,
};
use crate::database::insert::BatchInserter;
use crate::database::schema::SchemaManager;
use crate::error::{PipelineError, Result};
use crate::models::{Chunk, ChunkMetadata, ChunkRecord, Document, SearchFilters};
use crate::services::{DocumentStore, StoreStats, VectorMatch, VectorRecord, VectorStore};
use arrow_array::{Float32Array, RecordBatch};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct LanceDocumentStore {
    client: LanceDbClient,
}

impl LanceDocumentStore {
    pub fn new(client: LanceDbClient) -> Self {
        Self { client }
    }

    fn documents_table(&self) -> &str {
        &self.client.config().documents_table
    }

    fn chunks_table(&self) -> &str {
        &self.client.config().chunks_table
    }

    async fn documents_by_ids(&self, ids: &[String]) -> Result<HashMap<String, Document>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let batches = self
            .client
            .select(self.documents_table(), &in_filter("id", ids), ids.len())
            .await?;

        let mut documents = HashMap::new();
        for batch in &batches {
            for document in documents_from_batch(batch)? {
                documents.insert(document.id.clone(), document);
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for LanceDocumentStore {
    async fn insert_document(&self, document: &Document) -> Result<String> {
        let batch = BatchInserter::document_batch(std::slice::from_ref(document))?;
        BatchInserter::new(&self.client)
            .append(self.documents_table(), SchemaManager::documents_schema(), batch)
            .await?;
        debug!("Inserted document: {}", document.path);
        Ok(document.id.clone())
    }

    async fn insert_chunks(&self, doc_id: &str, texts: &[String]) -> Result<Vec<String>> {
        if self.client.table_exists(self.chunks_table()).await? {
            let table = self.client.get_table(self.chunks_table()).await?;
            table
                .delete(&format!("doc_id = {}", sql_literal(doc_id)))
                .await
                .map_err(|e| PipelineError::Database(format!("Failed to clear chunks: {}", e)))?;
        }

        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk::new(doc_id, ordinal as u32, text.clone()))
            .collect();
        let batch = BatchInserter::chunk_batch(&chunks)?;
        BatchInserter::new(&self.client)
            .append(self.chunks_table(), SchemaManager::chunks_schema(), batch)
            .await?;

        Ok(chunks.into_iter().map(|c| c.id).collect())
    }

    async fn set_vector_keys(&self, pairs: &[(String, String)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let table = self.client.get_table(self.chunks_table()).await?;
        for (chunk_id, key) in pairs {
            table
                .update()
                .only_if(format!("id = {}", sql_literal(chunk_id)))
                .column("vector_key", sql_literal(key))
                .execute()
                .await
                .map_err(|e| {
                    PipelineError::Database(format!(
                        "Failed to set vector key for {}: {}",
                        chunk_id, e
                    ))
                })?;
        }
        debug!("Back-filled {} vector keys", pairs.len());
        Ok(())
    }

    async fn get_chunks_by_keys(&self, keys: &[String]) -> Result<Vec<ChunkRecord>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let batches = self
            .client
            .select(self.chunks_table(), &in_filter("vector_key", keys), keys.len())
            .await?;

        let mut chunks: HashMap<String, Chunk> = HashMap::new();
        for batch in &batches {
            for chunk in chunks_from_batch(batch)? {
                if let Some(key) = chunk.vector_key.clone() {
                    chunks.insert(key, chunk);
                }
            }
        }

        let mut doc_ids: Vec<String> = chunks.values().map(|c| c.doc_id.clone()).collect();
        doc_ids.sort();
        doc_ids.dedup();
        let documents = self.documents_by_ids(&doc_ids).await?;

        Ok(keys
            .iter()
            .filter_map(|key| {
                let chunk = chunks.get(key)?;
                let doc = documents.get(&chunk.doc_id)?;
                Some(ChunkRecord {
                    chunk_id: chunk.id.clone(),
                    vector_key: key.clone(),
                    ordinal: chunk.ordinal,
                    text: chunk.text.clone(),
                    doc_id: doc.id.clone(),
                    title: doc.name.clone(),
                    path: doc.path.clone(),
                    description: doc.description.clone(),
                    source_url: doc.source_url.clone(),
                })
            })
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let mut documents = self.documents_by_ids(&[id.to_string()]).await?;
        Ok(documents.remove(id))
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            documents: self.client.count_rows(self.documents_table(), None).await?,
            chunks: self.client.count_rows(self.chunks_table(), None).await?,
            indexed_chunks: self
                .client
                .count_rows(self.chunks_table(), Some("vector_key IS NOT NULL".to_string()))
                .await?,
        })
    }

    async fn reset(&self) -> Result<()> {
        warn!("Dropping document and chunk tables");
        self.client.drop_table(self.documents_table()).await?;
        self.client.drop_table(self.chunks_table()).await
    }
}

pub struct LanceVectorStore {
    client: LanceDbClient,
    dimension: usize,
}

impl LanceVectorStore {
    pub fn new(client: LanceDbClient, dimension: usize) -> Self {
        Self { client, dimension }
    }

    fn table_name(&self) -> &str {
        &self.client.config().vectors_table
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<Vec<String>> {
        let keys: Vec<String> = records.iter().map(|_| Uuid::new_v4().to_string()).collect();
        let batch = BatchInserter::vector_batch(&records, &keys, self.dimension)?;
        BatchInserter::new(&self.client)
            .append(
                self.table_name(),
                SchemaManager::vectors_schema(self.dimension),
                batch,
            )
            .await?;
        Ok(keys)
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<VectorMatch>> {
        if !self.client.table_exists(self.table_name()).await? {
            warn!("Vector table does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.client.get_table(self.table_name()).await?;
        let mut query = table
            .vector_search(vector.to_vec())
            .map_err(|e| PipelineError::Database(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k);

        let filter = metadata_filter(filters);
        if !filter.is_empty() {
            debug!("Applied filter: {}", filter);
            query = query.only_if(filter);
        }

        let batches: Vec<RecordBatch> = query
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Vector search failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to read result batch: {}", e)))?;

        let mut matches = Vec::new();
        for batch in &batches {
            let keys = string_column(batch, "key")?;
            let jurisdictions = string_column(batch, "jurisdiction")?;
            let industries = string_column(batch, "industry")?;
            let doc_types = string_column(batch, "doc_type")?;
            // LanceDB reports cosine distance in a special column
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let score = distances.map_or(1.0, |d| 1.0 - d.value(i) as f64);
                matches.push(VectorMatch {
                    key: keys.value(i).to_string(),
                    score,
                    metadata: ChunkMetadata {
                        jurisdiction: jurisdictions.value(i).to_string(),
                        industry: industries.value(i).to_string(),
                        doc_type: doc_types.value(i).to_string(),
                    },
                });
            }
        }

        info!("Vector search returned {} results", matches.len());
        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        self.client.count_rows(self.table_name(), None).await
    }

    async fn reset(&self) -> Result<()> {
        warn!("Dropping vector table");
        self.client.drop_table(self.table_name()).await
    }
}

/// Exact-match predicate over the filterable metadata columns.
pub fn metadata_filter(filters: &SearchFilters) -> String {
    filters
        .pairs()
        .into_iter()
        .map(|(field, value)| format!("{} = {}", field, sql_literal(value)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn documents_from_batch(batch: &RecordBatch) -> Result<Vec<Document>> {
    let ids = string_column(batch, "id")?;
    let paths = string_column(batch, "path")?;
    let names = string_column(batch, "name")?;
    let texts = string_column(batch, "text")?;
    let hashes = string_column(batch, "content_hash")?;
    let sizes = u64_column(batch, "file_size")?;
    let descriptions = string_column(batch, "description")?;
    let source_urls = string_column(batch, "source_url")?;
    let created = u64_column(batch, "created_at")?;

    Ok((0..batch.num_rows())
        .map(|i| Document {
            id: ids.value(i).to_string(),
            path: paths.value(i).to_string(),
            name: names.value(i).to_string(),
            text: texts.value(i).to_string(),
            content_hash: hashes.value(i).to_string(),
            file_size: sizes.value(i),
            description: descriptions.value(i).to_string(),
            source_url: optional_value(source_urls, i),
            created_at: created.value(i),
        })
        .collect())
}

fn chunks_from_batch(batch: &RecordBatch) -> Result<Vec<Chunk>> {
    let ids = string_column(batch, "id")?;
    let doc_ids = string_column(batch, "doc_id")?;
    let ordinals = u32_column(batch, "ordinal")?;
    let texts = string_column(batch, "text")?;
    let keys = string_column(batch, "vector_key")?;

    Ok((0..batch.num_rows())
        .map(|i| Chunk {
            id: ids.value(i).to_string(),
            doc_id: doc_ids.value(i).to_string(),
            ordinal: ordinals.value(i),
            text: texts.value(i).to_string(),
            vector_key: optional_value(keys, i),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn client(dir: &tempfile::TempDir) -> LanceDbClient {
        LanceDbClient::new(DatabaseConfig {
            uri: dir.path().to_string_lossy().to_string(),
            documents_table: "documents".to_string(),
            chunks_table: "chunks".to_string(),
            vectors_table: "vectors".to_string(),
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_metadata_filter() {
        let filters = SearchFilters {
            jurisdiction: Some("Ohio".to_string()),
            industry: Some("  ".to_string()),
            doc_type: Some("policy".to_string()),
        };
        assert_eq!(
            metadata_filter(&filters),
            "jurisdiction = 'Ohio' AND doc_type = 'policy'"
        );
        assert_eq!(metadata_filter(&SearchFilters::default()), "");
    }

    #[tokio::test]
    async fn test_document_round_trip_and_key_join() {
        let dir = tempfile::tempdir().unwrap();
        let store = LanceDocumentStore::new(client(&dir).await);

        let doc = Document::new(
            "/virtual/ohio".to_string(),
            "Ohio Incentives".to_string(),
            "body".to_string(),
            "desc".to_string(),
        );
        let doc_id = store.insert_document(&doc).await.unwrap();
        let ids = store
            .insert_chunks(&doc_id, &["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(ids, vec![format!("{}:0", doc_id), format!("{}:1", doc_id)]);

        store
            .set_vector_keys(&[(ids[1].clone(), "k1".to_string())])
            .await
            .unwrap();

        let records = store
            .get_chunks_by_keys(&["k1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "second");
        assert_eq!(records[0].title, "Ohio Incentives");

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.indexed_chunks, 1);

        assert_eq!(store.get_document(&doc_id).await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn test_vector_search_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = LanceVectorStore::new(client(&dir).await, 3);

        let record = |vector: Vec<f32>, jurisdiction: &str| VectorRecord {
            vector,
            text: "t".to_string(),
            metadata: ChunkMetadata {
                jurisdiction: jurisdiction.to_string(),
                ..ChunkMetadata::default()
            },
        };
        let keys = store
            .insert(vec![
                record(vec![1.0, 0.0, 0.0], "Ohio"),
                record(vec![0.9, 0.1, 0.0], "Texas"),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let filters = SearchFilters {
            jurisdiction: Some("Texas".to_string()),
            ..SearchFilters::default()
        };
        let matches = store.search(&[1.0, 0.0, 0.0], 5, &filters).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, keys[1]);
        assert!(matches[0].score > 0.9);
    }
}
