// file: src/parser/metadata.rs
// description: heuristic document metadata for knowledge-base ingest
// reference: frequency and pattern heuristics over raw text

use super::patterns::{CITY_STATE, SENTENCE_BREAK, STATE_ABBREV, WORD_TOKEN, is_stopword};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const MAX_KEYWORDS: usize = 12;
const SUMMARY_SENTENCES: usize = 3;

const INDUSTRIES: &[&str] = &[
    "advanced manufacturing",
    "manufacturing",
    "biotech",
    "biotechnology",
    "logistics",
    "cleantech",
    "aerospace",
    "software",
    "technology",
    "healthcare",
    "agriculture",
    "energy",
    "automotive",
    "finance",
];

const COMMON_STATES: &[&str] = &["CA", "NY", "TX", "FL", "OH", "PA", "IL", "MI", "NC", "GA"];

const MAJOR_CITIES: &[&str] = &[
    "new york",
    "los angeles",
    "chicago",
    "houston",
    "phoenix",
    "philadelphia",
    "san antonio",
    "san diego",
    "dallas",
    "san jose",
    "austin",
    "columbus",
    "charlotte",
    "san francisco",
    "indianapolis",
    "seattle",
    "denver",
    "washington",
    "boston",
    "nashville",
    "detroit",
    "portland",
    "memphis",
    "baltimore",
    "milwaukee",
    "albuquerque",
    "atlanta",
    "colorado springs",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub title: String,
    pub jurisdiction: Option<String>,
    pub industry: Option<String>,
    pub doc_type: String,
    pub keywords: Vec<String>,
    pub summary: String,
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str, filename: &str) -> ExtractedMetadata {
        ExtractedMetadata {
            title: self.title(text, filename),
            jurisdiction: self.jurisdiction(text),
            industry: self.industry(text),
            doc_type: self.doc_type(text, filename),
            keywords: self.keywords(text),
            summary: self.summary(text),
        }
    }

    pub fn title(&self, text: &str, filename: &str) -> String {
        let from_lines = text.lines().take(5).map(str::trim).find(|line| {
            let len = line.chars().count();
            let lower = line.to_lowercase();
            (20..=100).contains(&len)
                && !["the ", "this ", "a "].iter().any(|p| lower.starts_with(p))
        });
        if let Some(line) = from_lines {
            return line.to_string();
        }

        if let Some(stem) = Path::new(filename).file_stem().and_then(|s| s.to_str())
            && !stem.is_empty()
        {
            return title_case(&stem.replace(['_', '-'], " "));
        }

        let first_sentence = text.split(['.', '!', '?']).next().unwrap_or("").trim();
        if !first_sentence.is_empty() && first_sentence.chars().count() <= 100 {
            return first_sentence.to_string();
        }

        "Untitled Document".to_string()
    }

    pub fn jurisdiction(&self, text: &str) -> Option<String> {
        if let Some(caps) = CITY_STATE.captures(text) {
            return Some(format!("{}, {}", &caps[1], &caps[2]));
        }

        if let Some(state) = STATE_ABBREV
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .find(|abbrev| COMMON_STATES.contains(&abbrev.as_str()))
        {
            return Some(state);
        }

        let lower = text.to_lowercase();
        MAJOR_CITIES
            .iter()
            .find(|city| lower.contains(*city))
            .map(|city| title_case(city))
    }

    /// Most frequently mentioned industry; ties go to the earlier entry.
    pub fn industry(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        let mut best: Option<(&str, usize)> = None;

        for industry in INDUSTRIES {
            let count = lower.matches(industry).count();
            if count > 0 && best.is_none_or(|(_, top)| count > top) {
                best = Some((industry, count));
            }
        }

        best.map(|(industry, _)| industry.to_string())
    }

    pub fn doc_type(&self, text: &str, filename: &str) -> String {
        let name = filename.to_lowercase();
        let name_rules: [(&[&str], &str); 6] = [
            (&["case", "study"], "case_study"),
            (&["incentive", "tax", "credit"], "incentive"),
            (&["policy", "ordinance", "regulation"], "policy"),
            (&["profile", "overview", "about"], "city_profile"),
            (&["rfp", "request", "proposal"], "rfp_example"),
            (&["press", "news", "release"], "press_release"),
        ];
        if let Some((_, doc_type)) = name_rules
            .iter()
            .find(|(terms, _)| terms.iter().any(|t| name.contains(t)))
        {
            return doc_type.to_string();
        }

        let body = text.to_lowercase();
        let content_rules: [(&[&str], &str); 6] = [
            (&["case study", "success story"], "case_study"),
            (&["tax incentive", "tax credit", "abatement"], "incentive"),
            (&["policy", "ordinance", "regulation", "zoning"], "policy"),
            (&["request for proposal", "rfp"], "rfp_example"),
            (&["press release", "announces", "announcement"], "press_release"),
            (&["economic data", "statistics", "census"], "economic_data"),
        ];
        content_rules
            .iter()
            .find(|(terms, _)| terms.iter().any(|t| body.contains(t)))
            .map(|(_, doc_type)| doc_type.to_string())
            .unwrap_or_else(|| "other".to_string())
    }

    /// Words seen at least twice, most frequent first, ties in first-seen order.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for word in WORD_TOKEN.find_iter(&lower).map(|m| m.as_str()) {
            if is_stopword(word) {
                continue;
            }
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }

        order.sort_by(|a, b| counts[b].cmp(&counts[a]));
        order
            .into_iter()
            .take(MAX_KEYWORDS)
            .filter(|w| counts[w] >= 2)
            .map(str::to_string)
            .collect()
    }

    pub fn summary(&self, text: &str) -> String {
        let sentences: Vec<&str> = SENTENCE_BREAK
            .split(text)
            .take(10)
            .map(str::trim)
            .filter(|s| {
                let len = s.chars().count();
                let lower = s.to_lowercase();
                (20..=200).contains(&len)
                    && !["table", "figure", "page"].iter().any(|p| lower.starts_with(p))
            })
            .take(SUMMARY_SENTENCES)
            .collect();

        if !sentences.is_empty() {
            return format!("{}.", sentences.join(". "));
        }

        match text.char_indices().nth(200) {
            Some((idx, _)) => format!("{}...", text[..idx].trim()),
            None => text.trim().to_string(),
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_from_first_lines() {
        let extractor = MetadataExtractor::new();
        let text = "Intro\nOhio Job Creation Tax Credit Program\nbody";
        assert_eq!(
            extractor.title(text, ""),
            "Ohio Job Creation Tax Credit Program"
        );
    }

    #[test]
    fn test_title_from_filename() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.title("short", "docs/columbus_site-profile.txt"),
            "Columbus Site Profile"
        );
    }

    #[test]
    fn test_jurisdiction_city_state() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.jurisdiction("Located in Columbus, OH near the airport"),
            Some("Columbus, OH".to_string())
        );
        assert_eq!(
            extractor.jurisdiction("the site is in Columbus, OH today"),
            Some("Columbus, OH".to_string())
        );
    }

    #[test]
    fn test_jurisdiction_falls_back_to_city_names() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.jurisdiction("incentives offered around denver metro"),
            Some("Denver".to_string())
        );
        assert_eq!(extractor.jurisdiction("no place mentioned"), None);
    }

    #[test]
    fn test_industry_by_frequency() {
        let extractor = MetadataExtractor::new();
        let text = "Logistics hub. Aerospace suppliers. Logistics parks and logistics jobs.";
        assert_eq!(extractor.industry(text), Some("logistics".to_string()));
        assert_eq!(extractor.industry("nothing relevant"), None);
    }

    #[test]
    fn test_doc_type_filename_before_content() {
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.doc_type("zoning rules", "tax_credit.txt"), "incentive");
        assert_eq!(extractor.doc_type("zoning rules", "notes.txt"), "policy");
        assert_eq!(extractor.doc_type("plain words", "notes.txt"), "other");
    }

    #[test]
    fn test_keywords_require_two_mentions() {
        let extractor = MetadataExtractor::new();
        let text = "Workforce training and workforce grants. Training grants for workforce. Rail.";
        assert_eq!(
            extractor.keywords(text),
            vec!["workforce", "training", "grants"]
        );
    }

    #[test]
    fn test_summary_uses_leading_sentences() {
        let extractor = MetadataExtractor::new();
        let text = "Page 1. The county offers a property tax abatement. Eligible firms must add fifty jobs. Short.";
        assert_eq!(
            extractor.summary(text),
            "The county offers a property tax abatement. Eligible firms must add fifty jobs."
        );
    }
}
