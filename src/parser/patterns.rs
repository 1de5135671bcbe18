// file: src/parser/patterns.rs
// description: compiled regex patterns for text cleanup, headers and metadata
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Cleanup
    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).expect("WHITESPACE_RUN regex is valid");

    pub static ref DISALLOWED_CHAR: Regex = Regex::new(
        r"[^\w\s.,;:!?\-()\[\]/&%$#@]"
    ).expect("DISALLOWED_CHAR regex is valid");

    // Terms used for keyword overlap and keyword extraction
    pub static ref WORD_TOKEN: Regex = Regex::new(
        r"\b[a-z]{3,}\b"
    ).expect("WORD_TOKEN regex is valid");

    // Section headers, tried in order against a trimmed line
    pub static ref NUMBERED_HEADER: Regex = Regex::new(
        r"^(\d+\.?\s+[A-Z][^.\n]{5,80})\s*$"
    ).expect("NUMBERED_HEADER regex is valid");

    pub static ref LETTERED_HEADER: Regex = Regex::new(
        r"^([A-Z]\.?\s+[A-Z][^.\n]{5,80})\s*$"
    ).expect("LETTERED_HEADER regex is valid");

    pub static ref ROMAN_HEADER: Regex = Regex::new(
        r"^([IVX]+\.?\s+[A-Z][^.\n]{5,80})\s*$"
    ).expect("ROMAN_HEADER regex is valid");

    pub static ref ALL_CAPS_HEADER: Regex = Regex::new(
        r"^([A-Z][A-Z\s]{5,80})\s*$"
    ).expect("ALL_CAPS_HEADER regex is valid");

    pub static ref MARKDOWN_HEADER: Regex = Regex::new(
        r"^(#{1,3}\s+.+)$"
    ).expect("MARKDOWN_HEADER regex is valid");

    // Metadata heuristics
    pub static ref CITY_STATE: Regex = Regex::new(
        r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*),?\s+([A-Z]{2})\b"
    ).expect("CITY_STATE regex is valid");

    pub static ref STATE_ABBREV: Regex = Regex::new(
        r"\b([A-Z]{2})\b"
    ).expect("STATE_ABBREV regex is valid");

    pub static ref SENTENCE_BREAK: Regex = Regex::new(
        r"[.!?]+"
    ).expect("SENTENCE_BREAK regex is valid");
}

/// Header patterns in priority order.
pub fn header_patterns() -> [&'static Regex; 5] {
    [
        &NUMBERED_HEADER,
        &LETTERED_HEADER,
        &ROMAN_HEADER,
        &ALL_CAPS_HEADER,
        &MARKDOWN_HEADER,
    ]
}

pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
    "is", "are", "was", "were", "been", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can", "this", "that", "these", "those",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_patterns() {
        assert!(NUMBERED_HEADER.is_match("1. Introduction"));
        assert!(NUMBERED_HEADER.is_match("12 Scope of Services"));
        assert!(LETTERED_HEADER.is_match("A. Site Information"));
        assert!(ROMAN_HEADER.is_match("IV. Evaluation Criteria"));
        assert!(ALL_CAPS_HEADER.is_match("SUBMISSION REQUIREMENTS"));
        assert!(MARKDOWN_HEADER.is_match("## Workforce"));

        assert!(!NUMBERED_HEADER.is_match("1. Intro"));
        assert!(!ALL_CAPS_HEADER.is_match("ACRES"));
        assert!(!NUMBERED_HEADER.is_match("3. The site must be zoned. It must be flat"));
    }

    #[test]
    fn test_disallowed_characters() {
        assert!(DISALLOWED_CHAR.is_match("price * 2"));
        assert!(DISALLOWED_CHAR.is_match("“quoted”"));
        assert!(!DISALLOWED_CHAR.is_match("Cost: $1,200 (est.) [A/B] 50% #1 @home & more?!"));
    }

    #[test]
    fn test_stopwords() {
        assert!(is_stopword("the"));
        assert!(!is_stopword("incentive"));
    }
}
