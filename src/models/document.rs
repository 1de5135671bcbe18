// file: src/models/document.rs
// description: stored document, chunk and joined chunk record models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub name: String,
    pub text: String,
    pub content_hash: String,
    pub file_size: u64,
    pub description: String,
    pub source_url: Option<String>,
    pub created_at: u64,
}

impl Document {
    pub fn new(path: String, name: String, text: String, description: String) -> Self {
        let content_hash = Self::compute_hash(&text);
        let file_size = text.len() as u64;
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            id: Uuid::new_v4().to_string(),
            path,
            name,
            text,
            content_hash,
            file_size,
            description,
            source_url: None,
            created_at,
        }
    }

    pub fn with_source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Virtual storage path for content that never lived on disk.
    pub fn virtual_path(name: &str) -> String {
        format!("/virtual/{}", name.trim().replace(' ', "_").to_lowercase())
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// An indexed passage of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub ordinal: u32,
    pub text: String,
    pub vector_key: Option<String>,
}

impl Chunk {
    pub fn new(doc_id: &str, ordinal: u32, text: String) -> Self {
        Self {
            id: Self::make_id(doc_id, ordinal),
            doc_id: doc_id.to_string(),
            ordinal,
            text,
            vector_key: None,
        }
    }

    pub fn make_id(doc_id: &str, ordinal: u32) -> String {
        format!("{}:{}", doc_id, ordinal)
    }
}

/// Filterable fields carried next to each vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub jurisdiction: String,
    pub industry: String,
    pub doc_type: String,
}

/// A chunk joined with its parent document, as returned by key lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub vector_key: String,
    pub ordinal: u32,
    pub text: String,
    pub doc_id: String,
    pub title: String,
    pub path: String,
    pub description: String,
    pub source_url: Option<String>,
}

/// Caller-supplied metadata for ingest; blanks are filled heuristically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestMetadata {
    pub title: String,
    pub path: Option<String>,
    pub jurisdiction: Option<String>,
    pub industry: Option<String>,
    pub doc_type: Option<String>,
    pub source_url: Option<String>,
    pub description: Option<String>,
}

impl IngestMetadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
