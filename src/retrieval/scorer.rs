// file: src/retrieval/scorer.rs
// description: hybrid re-ranking that blends vector similarity with keyword overlap
// reference: weighted linear score fusion

use crate::config::RetrievalConfig;
use crate::models::SearchHit;
use crate::parser::patterns::{WORD_TOKEN, is_stopword};
use std::collections::HashSet;

/// Distinct lowercase terms of three or more letters, minus stopwords.
pub fn terms(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Fraction of query terms that also appear in the passage.
pub fn lexical_overlap(query_terms: &HashSet<String>, passage: &str) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let passage_terms = terms(passage);
    let shared = query_terms.intersection(&passage_terms).count();
    shared as f64 / query_terms.len() as f64
}

#[derive(Debug, Clone, Copy)]
pub struct HybridScorer {
    vector_weight: f64,
    lexical_weight: f64,
}

impl HybridScorer {
    pub fn new(vector_weight: f64, lexical_weight: f64) -> Self {
        Self {
            vector_weight,
            lexical_weight,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.vector_weight, config.lexical_weight)
    }

    pub fn blend(&self, vector_score: f64, lexical_score: f64) -> f64 {
        self.vector_weight * vector_score.clamp(0.0, 1.0) + self.lexical_weight * lexical_score
    }

    /// Fill in lexical and final scores, then stable-sort best first.
    pub fn rank(&self, query: &str, hits: &mut [SearchHit]) {
        let query_terms = terms(query);

        for hit in hits.iter_mut() {
            hit.vector_score = hit.vector_score.clamp(0.0, 1.0);
            hit.lexical_score = lexical_overlap(&query_terms, &hit.text);
            hit.score = self.blend(hit.vector_score, hit.lexical_score);
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    }
}

impl Default for HybridScorer {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, text: &str, vector_score: f64) -> SearchHit {
        SearchHit {
            doc_id: id.to_string(),
            title: id.to_string(),
            file_path: String::new(),
            text: text.to_string(),
            jurisdiction: String::new(),
            industry: String::new(),
            doc_type: String::new(),
            source_url: None,
            vector_score,
            lexical_score: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_terms_skip_short_words_and_stopwords() {
        let t = terms("The tax credit is for IT jobs in Ohio");
        let mut sorted: Vec<&str> = t.iter().map(String::as_str).collect();
        sorted.sort();
        assert_eq!(sorted, vec!["credit", "jobs", "ohio", "tax"]);
    }

    #[test]
    fn test_lexical_overlap() {
        let q = terms("ohio tax credit");
        assert!((lexical_overlap(&q, "Ohio offers a job creation tax credit") - 1.0).abs() < 1e-9);
        assert!((lexical_overlap(&q, "tax rates in Texas") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(lexical_overlap(&terms("the of a"), "anything"), 0.0);
    }

    #[test]
    fn test_scenario_vector_vs_keyword_blend() {
        // vector 0.9 with no overlap vs vector 0.8 with full overlap
        let scorer = HybridScorer::default();
        let mut hits = vec![
            hit("a", "unrelated passage about weather", 0.9),
            hit("b", "ohio tax credit details", 0.8),
        ];
        scorer.rank("ohio tax credit", &mut hits);

        assert!((hits[0].score - 0.83).abs() < 1e-9);
        assert!((hits[1].score - 0.765).abs() < 1e-9);
        assert_eq!(hits[0].doc_id, "b");
        assert_eq!(hits[1].doc_id, "a");
    }

    #[test]
    fn test_scores_bounded() {
        let scorer = HybridScorer::default();
        let mut hits = vec![
            hit("a", "ohio", 1.7),
            hit("b", "nothing", -0.4),
        ];
        scorer.rank("ohio", &mut hits);

        for h in &hits {
            assert!((0.0..=1.0).contains(&h.score));
            assert!((0.0..=1.0).contains(&h.vector_score));
        }
    }

    #[test]
    fn test_monotonic_in_vector_score() {
        let scorer = HybridScorer::default();
        assert!(scorer.blend(0.6, 0.5) > scorer.blend(0.5, 0.5));
        assert!(scorer.blend(0.5, 0.6) > scorer.blend(0.5, 0.5));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let scorer = HybridScorer::default();
        let mut hits = vec![hit("first", "x", 0.5), hit("second", "y", 0.5)];
        scorer.rank("zzz", &mut hits);
        assert_eq!(hits[0].doc_id, "first");
    }
}
