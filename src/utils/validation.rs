// file: src/utils/validation.rs
// description: input validation for queries, documents and paths
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::path::Path;

pub const MIN_K: usize = 1;
pub const MAX_K: usize = 50;

pub struct Validator;

impl Validator {
    pub fn validate_query(query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Search query is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn clamp_k(k: usize) -> usize {
        k.clamp(MIN_K, MAX_K)
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(PipelineError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(PipelineError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > 2048 {
            return Err(PipelineError::Validation(
                "Batch size too large (max 2048)".to_string(),
            ));
        }

        Ok(())
    }

    /// Cut to at most `max_chars` characters, appending `...` when cut.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}
