//! Text chunking with sentence-boundary awareness
//!
//! Splits document text into retrieval-sized passages, preferring sentence
//! and paragraph boundaries and falling back to hard character cuts. Each
//! chunk after the first re-reads the trailing `overlap` characters of its
//! predecessor so context survives the cut points.

use askdocs_core::{Error, Result};

/// Split text into chunks of at most `max_chunk_size` characters.
///
/// Returns a lazy iterator; recreating it from the same inputs yields the
/// same chunks. Empty or whitespace-only input yields no chunks rather
/// than an error.
pub fn split_text(text: &str, max_chunk_size: usize, overlap: usize) -> Result<ChunkSplitter<'_>> {
    if max_chunk_size == 0 {
        return Err(Error::InvalidConfiguration(
            "chunk size must be at least 1".to_string(),
        ));
    }
    if overlap >= max_chunk_size {
        return Err(Error::InvalidConfiguration(format!(
            "chunk overlap {overlap} must be smaller than chunk size {max_chunk_size}"
        )));
    }

    Ok(ChunkSplitter {
        text,
        max_chunk_size,
        overlap,
        pos: 0,
        finished: text.trim().is_empty(),
    })
}

/// Lazy chunk iterator produced by [`split_text`].
#[derive(Debug, Clone)]
pub struct ChunkSplitter<'a> {
    text: &'a str,
    max_chunk_size: usize,
    overlap: usize,
    pos: usize,
    finished: bool,
}

impl Iterator for ChunkSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            self.finished = true;
            return None;
        }

        // Byte offset after `max_chunk_size` characters, or the whole tail.
        let mut window_end = rest.len();
        let mut chars_seen = 0usize;
        for (i, _) in rest.char_indices() {
            if chars_seen == self.max_chunk_size {
                window_end = i;
                break;
            }
            chars_seen += 1;
        }

        if window_end == rest.len() {
            self.finished = true;
            return Some(rest.to_string());
        }

        // Prefer the last sentence or line boundary inside the window, as
        // long as cutting there still makes progress past the overlap.
        let cut = match last_boundary(&rest[..window_end]) {
            Some(b) if char_count(&rest[..b]) > self.overlap => b,
            _ => window_end,
        };

        let chunk = &rest[..cut];
        let back = trailing_chars_bytes(chunk, self.overlap);
        self.pos += cut - back;

        Some(chunk.to_string())
    }
}

/// Byte offset just past the last sentence-ending character, if any.
fn last_boundary(window: &str) -> Option<usize> {
    window
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .last()
        .map(|(i, c)| i + c.len_utf8())
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Byte length of the last `n` characters of `s`.
fn trailing_chars_bytes(s: &str, n: usize) -> usize {
    s.chars().rev().take(n).map(char::len_utf8).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks_of(text: &str, max: usize, overlap: usize) -> Vec<String> {
        split_text(text, max, overlap).unwrap().collect()
    }

    /// Concatenating the non-overlapping portions reconstructs the input.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                let skip = chunk
                    .char_indices()
                    .nth(overlap)
                    .map(|(b, _)| b)
                    .unwrap_or(chunk.len());
                out.push_str(&chunk[skip..]);
            }
        }
        out
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(matches!(
            split_text("some text", 10, 10),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(split_text("some text", 10, 12).is_err());
        assert!(split_text("some text", 10, 9).is_ok());
    }

    #[test]
    fn empty_and_whitespace_only_yield_no_chunks() {
        assert!(chunks_of("", 100, 10).is_empty());
        assert!(chunks_of("   \n\t  ", 100, 10).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunks_of("A single short sentence.", 100, 10);
        assert_eq!(chunks, vec!["A single short sentence.".to_string()]);
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let text = "word ".repeat(200);
        for chunk in chunks_of(&text, 50, 10) {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn cuts_prefer_sentence_boundaries() {
        let text = "First sentence here. Second sentence follows. Third one closes it out.";
        let chunks = chunks_of(text, 30, 0);
        assert!(chunks.len() > 1);
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn overlapping_chunks_repeat_the_tail_of_their_predecessor() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let overlap = 8;
        let chunks = chunks_of(text, 20, overlap);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .chars()
                .rev()
                .take(overlap)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn concatenating_non_overlapping_portions_reconstructs_the_document() {
        let samples = [
            "First sentence here. Second sentence follows. Third one closes it out.",
            "no punctuation at all just a very long run of words that keeps going and going",
            "Short.\n\nA new paragraph with more text in it. And a final line.",
            "accents héhé and emoji ✨ mixed in. نص عربي قصير هنا. Done.",
        ];
        for text in samples {
            for (max, overlap) in [(24, 0), (24, 6), (40, 12)] {
                let chunks = chunks_of(text, max, overlap);
                assert_eq!(
                    reconstruct(&chunks, overlap),
                    *text,
                    "failed for max={max} overlap={overlap}"
                );
            }
        }
    }

    #[test]
    fn iterator_is_restartable() {
        let text = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.";
        let first: Vec<String> = split_text(text, 20, 5).unwrap().collect();
        let second: Vec<String> = split_text(text, 20, 5).unwrap().collect();
        assert_eq!(first, second);
    }
}
