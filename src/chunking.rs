//! Word-bounded chunking of normalized paragraph sequences.

use serde::{Deserialize, Serialize};

/// Soft word-count threshold at which the running chunk is closed.
pub const DEFAULT_MAX_WORDS: usize = 500;

/// One bounded segment of a document's text, tagged with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position in document order; contiguous across the output.
    pub index: usize,
    pub text: String,
}

/// Greedy word-count packer.
///
/// Paragraphs are appended to a running buffer; when appending the next
/// paragraph would push the buffered word count past the threshold and the
/// buffer already holds something, the buffer is closed first. The threshold
/// is soft: it is consulted only at paragraph boundaries, so a single
/// paragraph longer than the threshold becomes one oversized chunk instead
/// of being split mid-sentence.
#[derive(Debug, Clone)]
pub struct WordChunker {
    max_words: usize,
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

impl WordChunker {
    pub fn new(max_words: usize) -> Self {
        debug_assert!(max_words > 0, "chunk threshold must be positive");
        Self { max_words }
    }

    /// Packs paragraphs into index-tagged chunks.
    ///
    /// Indices are exactly the output positions `0..n`, gap-free. An empty
    /// paragraph sequence yields no chunks.
    pub fn chunk<'a>(&self, paragraphs: impl IntoIterator<Item = &'a str>) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut word_count = 0usize;

        for paragraph in paragraphs {
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            if word_count + words.len() > self.max_words && !buffer.is_empty() {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: buffer.join(" "),
                });
                buffer.clear();
                word_count = 0;
            }
            word_count += words.len();
            buffer.extend(words);
        }

        if !buffer.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                text: buffer.join(" "),
            });
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paragraph_of(word_count: usize, tag: &str) -> String {
        (0..word_count)
            .map(|i| format!("{tag}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = WordChunker::default().chunk([]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn one_paragraph_at_exactly_the_threshold_is_one_chunk() {
        let paragraph = paragraph_of(500, "w");
        let chunks = WordChunker::default().chunk([paragraph.as_str()]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, paragraph);
    }

    #[test]
    fn two_paragraphs_past_the_threshold_split_at_the_boundary() {
        let first = paragraph_of(300, "a");
        let second = paragraph_of(300, "b");
        let chunks = WordChunker::default().chunk([first.as_str(), second.as_str()]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, first);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].text, second);
    }

    #[test]
    fn an_oversized_paragraph_is_never_split() {
        let oversized = paragraph_of(1200, "w");
        let chunks = WordChunker::default().chunk([oversized.as_str()]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, oversized);
    }

    #[test]
    fn small_paragraphs_pack_into_one_chunk_joined_by_spaces() {
        let chunks = WordChunker::default().chunk(["one two", "three", "four five six"]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one two three four five six");
    }

    #[test]
    fn indices_stay_contiguous_over_many_boundaries() {
        let paragraphs: Vec<String> = (0..9).map(|i| paragraph_of(200, &format!("p{i}_"))).collect();
        let chunks = WordChunker::default().chunk(paragraphs.iter().map(String::as_str));

        assert!(chunks.len() > 1);
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, position);
        }
    }

    proptest! {
        /// Packing never drops, duplicates, or reorders words, and indices
        /// are exactly the output positions.
        #[test]
        fn packing_preserves_words_and_indices(
            sizes in proptest::collection::vec(0usize..40, 0..24),
            threshold in 1usize..60,
        ) {
            let paragraphs: Vec<String> = sizes
                .iter()
                .enumerate()
                .map(|(i, n)| paragraph_of(*n, &format!("p{i}_")))
                .collect();

            let chunks = WordChunker::new(threshold).chunk(paragraphs.iter().map(String::as_str));

            for (position, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, position);
            }

            let original: Vec<&str> = paragraphs
                .iter()
                .flat_map(|p| p.split_whitespace())
                .collect();
            let packed: Vec<&str> = chunks
                .iter()
                .flat_map(|c| c.text.split_whitespace())
                .collect();
            prop_assert_eq!(original, packed);
        }
    }
}
