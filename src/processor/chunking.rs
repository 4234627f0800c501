//! # Text Chunking Module
//!
//! Splits long text into size-bounded windows for the extraction service.
//!
//! ## Chunking Strategy
//!
//! The text is tokenized into words and single whitespace characters. Tokens
//! are accumulated greedily until the next one would push the chunk past the
//! budget, then a new chunk starts. Words are never split and no whitespace is
//! dropped, so concatenating the chunks in order reproduces the input exactly.
//! A chunk only exceeds the budget when a single word does.
//!
//! Sizes are counted in characters, not bytes.

use serde::Serialize;
use tracing::{debug, instrument};

/// A window of text sent to the extraction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QAChunk {
    /// The text of the chunk
    pub text: String,

    /// Zero-based position of the chunk
    pub index: usize,

    /// Number of chunks the text was split into
    pub total: usize,
}

/// Split `text` into chunks of at most `max_chars` characters
#[instrument(skip(text), fields(len = text.len()))]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<QAChunk> {
    let max_chars = max_chars.max(1);

    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    let mut push = |token: &str| {
        let token_chars = token.chars().count();
        if current_chars > 0 && current_chars + token_chars > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(token);
        current_chars += token_chars;
    };

    for token in text.split_inclusive(char::is_whitespace) {
        match token.char_indices().last() {
            Some((at, c)) if c.is_whitespace() => {
                if at > 0 {
                    push(&token[..at]);
                }
                push(&token[at..]);
            }
            _ => push(token),
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    let total = pieces.len();
    debug!("Split text into {} chunks", total);

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| QAChunk { text, index, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(chunks: &[QAChunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_twenty_thousand_chars_make_three_chunks() {
        let text = "abcd ".repeat(4000);
        assert_eq!(text.chars().count(), 20000);

        let chunks = chunk_text(&text, 8000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 8000));
        assert_eq!(joined(&chunks), text);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total, 3);
        }
    }

    #[test]
    fn test_round_trip_keeps_whitespace() {
        let text = "The first  line\n\nSecond\tparagraph with   spacing \n";
        let chunks = chunk_text(text, 10);

        assert!(chunks.len() > 1);
        assert_eq!(joined(&chunks), text);
    }

    #[test]
    fn test_words_are_never_split() {
        let text = "short supercalifragilisticexpialidocious end";
        let chunks = chunk_text(text, 10);

        assert!(
            chunks
                .iter()
                .any(|c| c.text.trim() == "supercalifragilisticexpialidocious")
        );
        assert_eq!(joined(&chunks), text);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "صلاة زكاة صوم حج ".repeat(10);
        let chunks = chunk_text(&text, 20);

        assert!(chunks.iter().all(|c| c.text.chars().count() <= 20));
        assert_eq!(joined(&chunks), text);
    }

    #[test]
    fn test_word_filling_the_budget_stays_within_it() {
        let chunks = chunk_text("abcd efgh", 4);

        assert!(chunks.iter().all(|c| c.text.chars().count() <= 4));
        assert_eq!(chunks.first().map(|c| c.text.as_str()), Some("abcd"));
        assert_eq!(chunks.last().map(|c| c.text.as_str()), Some("efgh"));
        assert_eq!(joined(&chunks), "abcd efgh");
    }

    #[test]
    fn test_only_oversized_words_exceed_the_budget() {
        let text = "tiny enormousword  ok\nmore words here";
        let chunks = chunk_text(text, 6);

        for chunk in &chunks {
            let chars = chunk.text.chars().count();
            assert!(chars <= 6 || chunk.text == "enormousword", "{:?}", chunk.text);
        }
        assert_eq!(joined(&chunks), text);
    }

    #[test]
    fn test_empty_and_small_text() {
        assert!(chunk_text("", 8000).is_empty());

        let chunks = chunk_text("one chunk only", 8000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total, 1);
    }
}
