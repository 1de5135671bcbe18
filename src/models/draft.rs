// file: src/models/draft.rs
// description: proposal draft models produced from analyzed requirements
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSection {
    pub heading: String,
    pub content: String,
}

impl DraftSection {
    pub fn new(heading: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
        }
    }
}

/// A quantitative fact surfaced in the draft appendix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendixMetric {
    pub metric: String,
    pub value: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub file_path: String,
    pub source_url: Option<String>,
    pub excerpt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMethod {
    Llm,
    Deterministic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftResult {
    pub title: String,
    pub sections: Vec<DraftSection>,
    pub appendix_metrics: Vec<AppendixMetric>,
    pub citations: Vec<Citation>,
    pub method: DraftMethod,
    pub kb_context_used: bool,
}

impl DraftResult {
    /// Render as plain markdown for export.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.title);

        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.heading, section.content));
        }

        if !self.appendix_metrics.is_empty() {
            out.push_str("\n## Appendix\n\n| Metric | Value | Source |\n|---|---|---|\n");
            for m in &self.appendix_metrics {
                out.push_str(&format!("| {} | {} | {} |\n", m.metric, m.value, m.source));
            }
        }

        if !self.citations.is_empty() {
            out.push_str("\n## Sources\n\n");
            for c in &self.citations {
                match &c.source_url {
                    Some(url) => out.push_str(&format!("- {} ({})\n", c.title, url)),
                    None => out.push_str(&format!("- {} ({})\n", c.title, c.file_path)),
                }
            }
        }

        out
    }
}
