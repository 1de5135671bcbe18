// file: src/database/client.rs
// description: LanceDB client wrapper with connection management and row helpers
// reference: https://docs.rs/lancedb

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use arrow_array::{Array, RecordBatch, StringArray, UInt32Array, UInt64Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use tracing::{debug, info};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    config: DatabaseConfig,
}

impl LanceDbClient {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self { connection, config })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        // Listing tables doubles as a ping
        self.connection
            .table_names()
            .execute()
            .await
            .map(|_| true)
            .map_err(|e| PipelineError::Database(format!("LanceDB connection failed: {}", e)))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::Database(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    /// Row count, optionally filtered. A missing table counts as empty.
    pub async fn count_rows(&self, table_name: &str, filter: Option<String>) -> Result<usize> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(table_name).await?;
        table
            .count_rows(filter)
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to count rows: {}", e)))
    }

    /// All rows matching `filter`, up to `limit`.
    pub async fn select(
        &self,
        table_name: &str,
        filter: &str,
        limit: usize,
    ) -> Result<Vec<RecordBatch>> {
        if !self.table_exists(table_name).await? {
            return Ok(Vec::new());
        }

        let table = self.get_table(table_name).await?;
        table
            .query()
            .only_if(filter)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Query on {} failed: {}", table_name, e)))?
            .try_collect()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to read result batch: {}", e)))
    }

    pub async fn drop_table(&self, table_name: &str) -> Result<()> {
        if !self.table_exists(table_name).await? {
            return Ok(());
        }

        self.connection.drop_table(table_name).await.map_err(|e| {
            PipelineError::Database(format!("Failed to drop table {}: {}", table_name, e))
        })?;
        info!("Dropped table: {}", table_name);
        Ok(())
    }
}

/// SQL string literal with embedded quotes doubled.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `column IN ('a', 'b')` for a non-empty value list.
pub fn in_filter(column: &str, values: &[String]) -> String {
    let list: Vec<String> = values.iter().map(|v| sql_literal(v)).collect();
    format!("{} IN ({})", column, list.join(", "))
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

pub fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

pub fn u64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

/// Nullable string cell.
pub fn optional_value(column: &StringArray, row: usize) -> Option<String> {
    if column.is_null(row) {
        None
    } else {
        Some(column.value(row).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("O'Hare"), "'O''Hare'");
    }

    #[test]
    fn test_in_filter() {
        let values = vec!["a".to_string(), "b'c".to_string()];
        assert_eq!(in_filter("vector_key", &values), "vector_key IN ('a', 'b''c')");
    }

    #[tokio::test]
    async fn test_missing_table_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let client = LanceDbClient::new(DatabaseConfig {
            uri: dir.path().to_string_lossy().to_string(),
            documents_table: "documents".to_string(),
            chunks_table: "chunks".to_string(),
            vectors_table: "vectors".to_string(),
        })
        .await
        .unwrap();

        assert!(client.ping().await.unwrap());
        assert_eq!(client.count_rows("documents", None).await.unwrap(), 0);
        assert!(client.select("documents", "id = 'x'", 1).await.unwrap().is_empty());
    }
}
