// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub chunking: ChunkingConfig,
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub documents_table: String,
    pub chunks_table: String,
    pub vectors_table: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub snippet_chars: usize,
    pub vector_weight: f64,
    pub lexical_weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub min_chunk_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    pub chunk_threshold_chars: usize,
    pub single_retry_delay_ms: u64,
    pub section_retry_delay_ms: u64,
    pub critical_gaps_cap: usize,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

/// Directory ingest filters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    pub extensions: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string(), "md".to_string()],
            skip_patterns: vec![".git/".to_string(), "*.lock".to_string()],
            max_file_size_mb: 10,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            snippet_chars: 1200,
            vector_weight: 0.85,
            lexical_weight: 0.15,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: 800,
            overlap_tokens: 80,
            min_chunk_chars: 500,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_threshold_chars: 8000,
            single_retry_delay_ms: 1000,
            section_retry_delay_ms: 500,
            critical_gaps_cap: 10,
            deadline_secs: None,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default_config();
        let mut builder = config::Config::builder()
            .add_source(
                config::Config::try_from(&defaults)
                    .map_err(|e| PipelineError::Config(e.to_string()))?,
            );

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RFP_RAG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.apply_shared_api_key(std::env::var("OPENAI_API_KEY").ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                uri: "data/lancedb".to_string(),
                documents_table: "documents".to_string(),
                chunks_table: "chunks".to_string(),
                vectors_table: "kb_vectors".to_string(),
            },
            embedding: EmbeddingConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "text-embedding-3-large".to_string(),
                dimension: 3072,
                batch_size: 64,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-5-mini".to_string(),
                timeout_secs: 120,
            },
            retrieval: RetrievalConfig::default(),
            chunking: ChunkingConfig::default(),
            extraction: ExtractionConfig::default(),
            scan: ScanConfig::default(),
        }
    }

    /// `OPENAI_API_KEY` fills whichever client key was left unset.
    fn apply_shared_api_key(&mut self, shared: Option<String>) {
        let Some(key) = shared.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = Some(key.clone());
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(PipelineError::Config(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        Validator::validate_batch_size(self.embedding.batch_size)
            .map_err(|e| PipelineError::Config(format!("embedding.batch_size: {}", e)))?;

        for (key, url) in [
            ("embedding.base_url", &self.embedding.base_url),
            ("llm.base_url", &self.llm.base_url),
        ] {
            Validator::validate_url(url)
                .map_err(|e| PipelineError::Config(format!("{}: {}", key, e)))?;
        }

        if self.retrieval.default_k == 0 {
            return Err(PipelineError::Config(
                "retrieval.default_k must be greater than 0".to_string(),
            ));
        }

        let weights = [self.retrieval.vector_weight, self.retrieval.lexical_weight];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w))
            || (weights[0] + weights[1] - 1.0).abs() > 1e-6
        {
            return Err(PipelineError::Config(format!(
                "retrieval weights must lie in [0, 1] and sum to 1 (got {} + {})",
                weights[0], weights[1]
            )));
        }

        if self.chunking.target_tokens == 0 {
            return Err(PipelineError::Config(
                "chunking.target_tokens must be greater than 0".to_string(),
            ));
        }

        if self.scan.max_file_size_mb == 0 {
            return Err(PipelineError::Config(
                "scan.max_file_size_mb must be greater than 0".to_string(),
            ));
        }

        if self.extraction.chunk_threshold_chars == 0 {
            return Err(PipelineError::Config(
                "extraction.chunk_threshold_chars must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.vector_weight, 0.85);
        assert_eq!(config.retrieval.lexical_weight, 0.15);
        assert_eq!(config.extraction.chunk_threshold_chars, 8000);
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let mut config = Config::default_config();
        config.retrieval.vector_weight = 0.9;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default_config();
        config.llm.base_url = "api.openai.com/v1".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.base_url"));
    }

    #[test]
    fn test_shared_api_key_fills_missing_only() {
        let mut config = Config::default_config();
        config.llm.api_key = Some("llm-key".to_string());
        config.apply_shared_api_key(Some("shared".to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("llm-key"));
        assert_eq!(config.embedding.api_key.as_deref(), Some("shared"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[retrieval]\ndefault_k = 7\nsnippet_chars = 300\nvector_weight = 0.7\nlexical_weight = 0.3\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retrieval.default_k, 7);
        assert_eq!(config.retrieval.snippet_chars, 300);
        assert_eq!(config.database.documents_table, "documents");
    }
}
