// file: src/parser/chunker.rs
// description: overlapping word-window chunking for retrieval passages
// reference: token counts approximated as 0.75 words per token

use super::normalizer::TextNormalizer;
use crate::config::ChunkingConfig;
use tracing::debug;

const WORDS_PER_TOKEN: f64 = 0.75;
const MIN_WINDOWED_WORDS: usize = 50;

pub struct Chunker {
    target_tokens: usize,
    overlap_tokens: usize,
    min_chunk_chars: usize,
    normalizer: TextNormalizer,
}

impl Chunker {
    pub fn new(target_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            target_tokens,
            overlap_tokens,
            min_chunk_chars: ChunkingConfig::default().min_chunk_chars,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            min_chunk_chars: config.min_chunk_chars,
            ..Self::new(config.target_tokens, config.overlap_tokens)
        }
    }

    pub fn words_per_chunk(&self) -> usize {
        ((self.target_tokens as f64 * WORDS_PER_TOKEN).round() as usize).max(1)
    }

    pub fn overlap_words(&self) -> usize {
        (self.overlap_tokens as f64 * WORDS_PER_TOKEN).round() as usize
    }

    pub fn min_chunk_chars(&self) -> usize {
        self.min_chunk_chars
    }

    /// Split `text` into overlapping passages of roughly `target_tokens`.
    ///
    /// Every returned passage is at least `min_chunk_chars` long; text too
    /// short to produce one yields an empty vector.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = self.normalizer.normalize(text);
        let words: Vec<&str> = normalized.split_whitespace().collect();

        if words.len() < MIN_WINDOWED_WORDS {
            return if self.long_enough(&normalized) {
                vec![normalized]
            } else {
                Vec::new()
            };
        }

        let window = self.words_per_chunk();
        let overlap = self.overlap_words();
        let step = if window > overlap {
            window - overlap
        } else {
            window
        };

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + window).min(words.len());
            let passage = words[start..end].join(" ");

            // passages under the minimum length are never indexed
            if self.long_enough(&passage) {
                chunks.push(passage);
            }

            if end >= words.len() {
                break;
            }
            start += step;
        }

        if chunks.is_empty() && self.long_enough(&normalized) {
            chunks.push(normalized.clone());
        }

        debug!(
            chunks = chunks.len(),
            words = words.len(),
            "chunked text"
        );
        chunks
    }

    fn long_enough(&self, passage: &str) -> bool {
        passage.chars().count() >= self.min_chunk_chars
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("word{:05}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_window_sizes() {
        let chunker = Chunker::new(800, 80);
        assert_eq!(chunker.words_per_chunk(), 600);
        assert_eq!(chunker.overlap_words(), 60);
        assert_eq!(Chunker::new(0, 0).words_per_chunk(), 1);
    }

    #[test]
    fn test_short_input_below_threshold_is_dropped() {
        let text = vec!["tiny"; 40].join(" ");
        assert!(Chunker::default().chunk(&text).is_empty());
    }

    #[test]
    fn test_short_input_above_threshold_is_single_chunk() {
        let text = vec!["infrastructure"; 40].join(" ");
        let chunks = Chunker::default().chunk(&text);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_every_chunk_meets_minimum_length() {
        let text = numbered_words(1500);
        let chunks = Chunker::default().chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() >= 500));
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = numbered_words(1500);
        let chunker = Chunker::default();
        let chunks = chunker.chunk(&text);
        let overlap = chunker.overlap_words();

        for pair in chunks.windows(2) {
            let left: Vec<&str> = pair[0].split(' ').collect();
            let right: Vec<&str> = pair[1].split(' ').collect();
            assert_eq!(&left[left.len() - overlap..], &right[..overlap]);
        }
    }

    #[test]
    fn test_chunks_cover_every_word() {
        let text = numbered_words(2000);
        let chunks = Chunker::default().chunk(&text);

        let mut covered: Vec<&str> = Vec::new();
        for chunk in &chunks {
            for word in chunk.split(' ') {
                if covered.last().is_none_or(|last| *last < word) {
                    covered.push(word);
                }
            }
        }

        let original: Vec<&str> = text.split(' ').collect();
        assert_eq!(covered, original);
    }

    #[test]
    fn test_short_tail_is_dropped_and_overlap_is_exact() {
        // 1150 five-char words: the third window holds 70 words, under 500 chars
        let text = (0..1150)
            .map(|i| format!("a{:04}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunker = Chunker::default();
        let chunks = chunker.chunk(&text);
        let overlap = chunker.overlap_words();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("a0540"));
        assert!(chunks[1].ends_with("a1139"));
        assert!(chunks.iter().all(|c| c.chars().count() >= 500));

        for pair in chunks.windows(2) {
            let left: Vec<&str> = pair[0].split(' ').collect();
            let right: Vec<&str> = pair[1].split(' ').collect();
            let shared = left.iter().filter(|w| right.contains(w)).count();
            assert_eq!(shared, overlap);
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_window_still_terminates() {
        let chunker = Chunker::new(100, 200);
        let text = numbered_words(300);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].starts_with("word00000"));
        assert!(chunks[1].starts_with("word00075"));
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = numbered_words(1700);
        let chunker = Chunker::default();
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }
}
