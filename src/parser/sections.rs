// file: src/parser/sections.rs
// description: header-heuristic section splitting for long documents
// reference: numbered, lettered, roman, all-caps and markdown header conventions

use super::patterns::header_patterns;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DOCUMENT_START: &str = "Document Start";
pub const FULL_DOCUMENT: &str = "Full Document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub header: String,
    pub body: String,
}

impl Section {
    pub fn new(header: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            body: body.into(),
        }
    }
}

pub struct SectionSplitter;

impl SectionSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Split on header lines. Fewer than two non-empty sections collapses
    /// to one `"Full Document"` section holding the untouched input.
    pub fn split(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut header = DOCUMENT_START.to_string();
        let mut body = String::new();

        for line in text.lines() {
            match self.match_header(line) {
                Some(matched) => {
                    Self::flush(&mut sections, &header, &body);
                    header = matched;
                    body.clear();
                }
                None => {
                    body.push_str(line);
                    body.push('\n');
                }
            }
        }
        Self::flush(&mut sections, &header, &body);

        if sections.len() <= 1 {
            sections = vec![Section::new(FULL_DOCUMENT, text)];
        }

        info!(
            sections = sections.len(),
            headers = ?sections.iter().map(|s| s.header.as_str()).collect::<Vec<_>>(),
            "split document into sections"
        );
        sections
    }

    fn match_header(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        header_patterns().iter().find_map(|pattern| {
            pattern
                .captures(trimmed)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
    }

    fn flush(sections: &mut Vec<Section>, header: &str, body: &str) {
        let body = body.trim();
        if !body.is_empty() {
            sections.push(Section::new(header, body));
        }
    }
}

impl Default for SectionSplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_numbered_headers_with_preamble() {
        let text = "Issued by the County\n1. Introduction Overview\nWe seek a site.\n2. Site Requirements\nMust have 100 acres.\nRail access preferred.";
        let sections = SectionSplitter::new().split(text);

        assert_eq!(
            sections,
            vec![
                Section::new(DOCUMENT_START, "Issued by the County"),
                Section::new("1. Introduction Overview", "We seek a site."),
                Section::new(
                    "2. Site Requirements",
                    "Must have 100 acres.\nRail access preferred."
                ),
            ]
        );
    }

    #[test]
    fn test_mixed_header_styles() {
        let text = "## Workforce\nTraining programs.\nA. Site Information\nParcel data.\nSUBMISSION FORMAT\nPDF only.\nIV. Evaluation Criteria\nScored on cost.";
        let headers: Vec<String> = SectionSplitter::new()
            .split(text)
            .into_iter()
            .map(|s| s.header)
            .collect();

        assert_eq!(
            headers,
            vec![
                "## Workforce",
                "A. Site Information",
                "SUBMISSION FORMAT",
                "IV. Evaluation Criteria"
            ]
        );
    }

    #[test]
    fn test_empty_sections_are_dropped() {
        let text = "1. Introduction Overview\n\n2. Site Requirements\nMust have rail.\n3. Workforce Section\nSTEM share.";
        let sections = SectionSplitter::new().split(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header, "2. Site Requirements");
    }

    #[test]
    fn test_no_headers_returns_full_document() {
        let text = "just a paragraph of text\nwith two lines";
        assert_eq!(
            SectionSplitter::new().split(text),
            vec![Section::new(FULL_DOCUMENT, text)]
        );
    }

    #[test]
    fn test_single_section_returns_full_document() {
        let text = "1. Introduction Overview\nOnly one section here.";
        let sections = SectionSplitter::new().split(text);
        assert_eq!(sections, vec![Section::new(FULL_DOCUMENT, text)]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            SectionSplitter::new().split(""),
            vec![Section::new(FULL_DOCUMENT, "")]
        );
    }
}
