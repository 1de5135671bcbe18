// file: src/parser/normalizer.rs
// description: text cleanup applied before chunking and scoring
// reference: OCR artifact cleanup heuristics

use super::patterns::{DISALLOWED_CHAR, WHITESPACE_RUN};

/// Runs of this many identical characters or more are shortened.
const REPEAT_RUN_MIN: usize = 4;
const REPEAT_RUN_KEEP: usize = 2;

pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Collapse whitespace, blank out characters outside the allowed set and
    /// shorten long repeated-character runs such as `-----` or `.....`.
    pub fn normalize(&self, content: &str) -> String {
        let mut normalized = self.collapse_whitespace(content);
        normalized = self.strip_disallowed(&normalized);
        normalized = self.collapse_whitespace(&normalized);
        self.suppress_repeats(&normalized)
    }

    fn collapse_whitespace(&self, content: &str) -> String {
        WHITESPACE_RUN.replace_all(content.trim(), " ").into_owned()
    }

    fn strip_disallowed(&self, content: &str) -> String {
        DISALLOWED_CHAR.replace_all(content, " ").into_owned()
    }

    fn suppress_repeats(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            let mut run = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                run += 1;
            }

            let keep = if run >= REPEAT_RUN_MIN {
                REPEAT_RUN_KEEP
            } else {
                run
            };
            result.extend(std::iter::repeat_n(c, keep));
        }

        result
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
