//! Sentence-aligned text chunking.
//!
//! [`chunk_text`] is pure and deterministic: it splits text into sentence
//! units at terminal punctuation followed by whitespace, then accumulates
//! sentences into chunks bounded by a character budget, carrying a
//! character-measured overlap from the sentence that overflowed into the
//! next chunk. The sentence split is a lexical heuristic: abbreviations
//! and decimals may under- or over-split, which is accepted.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Split trimmed text into sentence units. The terminal mark stays with
/// its sentence; the whitespace run after it is consumed.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The terminal mark is a single ASCII byte.
        let end = boundary.start() + 1;
        sentences.push(&text[start..end]);
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Last `count` characters of `sentence` (the whole sentence if shorter).
fn char_tail(sentence: &str, count: usize) -> &str {
    let chars = sentence.chars().count();
    if chars <= count {
        return sentence;
    }
    sentence
        .char_indices()
        .nth(chars - count)
        .map(|(idx, _)| &sentence[idx..])
        .unwrap_or(sentence)
}

/// Split `text` into overlapping, sentence-aligned chunks.
///
/// Budget and overlap are measured in characters. A sentence that fits the
/// remaining budget is appended with a single trailing separator. A
/// sentence that does not fit closes the current chunk and reseeds the
/// buffer: with the last `overlap` characters of the overflowing sentence
/// when `overlap > 0` and the buffer held prior content, otherwise with
/// the full sentence. A sentence longer than `max_chunk_len` therefore
/// lands whole in an otherwise-empty buffer, and that chunk may exceed
/// the budget. Never returns empty or whitespace-only chunks.
pub fn chunk_text(text: &str, max_chunk_len: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();
        if buffer_chars + sentence_chars <= max_chunk_len {
            buffer.push_str(sentence);
            buffer_chars += sentence_chars;
        } else {
            let completed = buffer.trim();
            if !completed.is_empty() {
                chunks.push(completed.to_string());
            }
            let seed = if overlap == 0 || buffer_chars == 0 {
                sentence
            } else {
                char_tail(sentence, overlap)
            };
            buffer.clear();
            buffer.push_str(seed);
            buffer.push(' ');
            buffer_chars = seed.chars().count() + 1;
        }
        // Every consumed sentence, appended or seeded, gets the separator.
        buffer.push(' ');
        buffer_chars += 1;
    }

    let last = buffer.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_reference_boundaries_exactly() {
        let chunks = chunk_text("Hello world. Foo bar. Baz qux.", 15, 5);
        assert_eq!(chunks, vec!["Hello world.", "bar.  Baz qux."]);
    }

    #[test]
    fn empty_and_whitespace_input_yield_no_chunks() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("   \n\t  ", 100, 10).is_empty());
    }

    #[test]
    fn never_emits_empty_or_whitespace_chunks() {
        let chunks = chunk_text("One. Two! Three? Four. Five.", 3, 2);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty(), "chunk must carry content");
        }
    }

    #[test]
    fn zero_overlap_preserves_sentence_sequence() {
        let text = "Alpha beta gamma. Delta epsilon. Zeta eta theta. Iota kappa.";
        let chunks = chunk_text(text, 25, 0);
        assert!(chunks.len() > 1, "budget should force multiple chunks");

        // With no overlap, every sentence appears exactly once across the
        // concatenation, in the original order.
        let joined = chunks.join(" ");
        for sentence in [
            "Alpha beta gamma.",
            "Delta epsilon.",
            "Zeta eta theta.",
            "Iota kappa.",
        ] {
            assert_eq!(
                joined.matches(sentence).count(),
                1,
                "sentence duplicated or lost: {sentence}"
            );
        }
    }

    #[test]
    fn oversized_sentence_lands_whole_in_empty_buffer() {
        let long = "This single sentence is far longer than the configured budget.";
        let chunks = chunk_text(long, 10, 4);
        assert_eq!(chunks, vec![long.to_string()]);
    }

    #[test]
    fn overlap_is_taken_from_the_triggering_sentence() {
        let chunks = chunk_text("Hello world. Foo bar. Baz qux.", 15, 5);
        // " bar." is the 5-character tail of "Foo bar.", the sentence that
        // overflowed the first chunk.
        assert!(chunks[1].starts_with("bar."));
        assert!(!chunks[1].contains("Hello"));
    }

    #[test]
    fn multibyte_text_measures_characters_not_bytes() {
        // Four 3-byte characters per sentence; a byte-based budget check
        // would overflow immediately.
        let text = "日本語だ. 日本語だ.";
        let chunks = chunk_text(text, 12, 0);
        assert_eq!(chunks, vec!["日本語だ. 日本語だ."]);
    }

    #[test]
    fn consecutive_terminals_split_after_the_last_mark() {
        let sentences = split_sentences("Really?! Yes. Sure");
        assert_eq!(sentences, vec!["Really?!", "Yes.", "Sure"]);
    }
}
