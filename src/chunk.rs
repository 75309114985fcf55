//! Recursive character text splitter.
//!
//! Splits text into overlapping windows of at most `chunk_size` characters.
//! The splitter tries the coarsest separator first (`"\n\n"`), then falls
//! back to finer ones (`"\n"`, `" "`, and finally individual characters)
//! for any piece that is still too long. Separators stay attached to the
//! start of the piece that follows them, and every emitted chunk is
//! whitespace-trimmed.
//!
//! Consecutive chunks share up to `chunk_overlap` characters so that a
//! sentence cut at a boundary is still seen whole by at least one chunk.
//! Lengths are counted in characters, not bytes. The output is fully
//! deterministic for a given text and configuration.

use std::collections::VecDeque;

use anyhow::{bail, Result};

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters and always succeeds.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Creates a splitter with the default separators.
    ///
    /// Fails when `chunk_size` is zero or `chunk_overlap` is not smaller
    /// than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::with_separators(chunk_size, chunk_overlap, &DEFAULT_SEPARATORS)
    }

    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: &[&str],
    ) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk_size must be > 0");
        }
        if chunk_overlap >= chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: separators.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator present in the text
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut good: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good.push(piece);
                continue;
            }

            if !good.is_empty() {
                final_chunks.extend(self.merge_splits(&good));
                good.clear();
            }
            if finer.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !good.is_empty() {
            final_chunks.extend(self.merge_splits(&good));
        }

        final_chunks
    }

    /// Greedily packs small pieces into chunks, carrying trailing pieces
    /// worth at most `chunk_overlap` characters into the next chunk.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }

        docs
    }
}

/// Split on `separator`, keeping each separator at the start of the piece
/// that follows it. Empty pieces are dropped. An empty separator yields
/// single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut bounds: Vec<usize> = vec![0];
    bounds.extend(text.match_indices(separator).map(|(i, _)| i));
    bounds.push(text.len());

    bounds
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200).unwrap();
        let chunks = splitter.split_text("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  \n").is_empty());
    }

    #[test]
    fn test_paragraphs_under_limit_stay_together() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200).unwrap();
        let chunks = splitter.split_text("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.\n\nSecond paragraph.".to_string()]);
    }

    #[test]
    fn test_word_windows_without_overlap() {
        let splitter = RecursiveCharacterSplitter::new(10, 4).unwrap();
        let chunks = splitter.split_text("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_word_windows_with_overlap() {
        let splitter = RecursiveCharacterSplitter::new(10, 5).unwrap();
        let chunks = splitter.split_text("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
    }

    #[test]
    fn test_character_fallback_for_long_words() {
        let splitter = RecursiveCharacterSplitter::new(4, 1).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = (0..200)
            .map(|i| format!("Sentence number {} talks about things.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let splitter = RecursiveCharacterSplitter::new(120, 30).unwrap();
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 120, "chunk too long: {}", c.len());
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let splitter = RecursiveCharacterSplitter::new(6, 0).unwrap();
        let chunks = splitter.split_text("ééééé ààààà");
        assert_eq!(chunks, vec!["ééééé", "ààààà"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma.\n\nDelta epsilon.\nZeta eta theta iota kappa lambda.";
        let splitter = RecursiveCharacterSplitter::new(20, 8).unwrap();
        assert_eq!(splitter.split_text(text), splitter.split_text(text));
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
        assert!(RecursiveCharacterSplitter::new(100, 100).is_err());
        assert!(RecursiveCharacterSplitter::new(100, 150).is_err());
    }

    #[test]
    fn test_separator_kept_at_start_of_piece() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\nc"]
        );
        assert_eq!(
            split_keeping_separator("\n\n\n\n", "\n\n"),
            vec!["\n\n", "\n\n"]
        );
    }
}
