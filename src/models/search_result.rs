// file: src/models/search_result.rs
// description: Search hit and response models with blended scores
// reference: Used for hybrid re-ranked vector search results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: String,

    pub title: String,

    pub file_path: String,

    /// Passage text, truncated to the configured snippet length
    pub text: String,

    pub jurisdiction: String,
    pub industry: String,
    pub doc_type: String,
    pub source_url: Option<String>,

    /// Similarity reported by the vector store (0.0-1.0)
    pub vector_score: f64,

    /// Fraction of query terms found in the passage
    pub lexical_score: f64,

    /// Blended ranking score
    pub score: f64,
}

impl SearchHit {
    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = match self.text.char_indices().nth(max_content_len) {
            Some((idx, _)) => format!("{}...", &self.text[..idx]),
            None => self.text.clone(),
        };

        format!(
            "Score: {:.4} (vector {:.4}, keyword {:.2}) | {} ({})\n{}\n",
            self.score,
            self.vector_score,
            self.lexical_score,
            self.title,
            self.file_path,
            content_preview
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub out_of_scope: bool,
}

impl SearchResponse {
    pub fn out_of_scope() -> Self {
        Self {
            hits: Vec::new(),
            out_of_scope: true,
        }
    }

    pub fn in_scope(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            out_of_scope: false,
        }
    }
}

/// Exact-match filters on the vector store's metadata fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub jurisdiction: Option<String>,
    pub industry: Option<String>,
    pub doc_type: Option<String>,
}

impl SearchFilters {
    /// Non-empty `(field, value)` pairs, in a fixed field order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("jurisdiction", self.jurisdiction.as_deref()),
            ("industry", self.industry.as_deref()),
            ("doc_type", self.doc_type.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (field, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}
