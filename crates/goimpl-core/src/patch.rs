//! Text edits and content hashes for in-place source rewriting.
//!
//! This module implements the small patch layer goimpl needs:
//! - Byte spans over source text
//! - Span-anchored edits (insertions and replacements)
//! - Batch application from end to start, with conflict detection
//! - Content hashes for detecting concurrent modification before write-back

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Span
// ============================================================================

/// A byte range in source text (start inclusive, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span. `end` is clamped so it never precedes `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Span {
            start,
            end: end.max(start),
        }
    }

    /// An empty span at `offset`, used for insertions.
    pub fn empty_at(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap. An
    /// empty span overlaps a span that strictly contains its offset, so an
    /// insertion inside a replaced range is a conflict.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The text this span covers, if it lies within `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

// ============================================================================
// Edits
// ============================================================================

/// Replace the text in `span` with `new_text`. An empty span inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// The byte span to replace.
    pub span: Span,
    /// Replacement text.
    pub new_text: String,
}

impl TextEdit {
    /// Insert `text` at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        TextEdit {
            span: Span::empty_at(offset),
            new_text: text.into(),
        }
    }

    /// Replace `span` with `text`.
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        TextEdit {
            span,
            new_text: text.into(),
        }
    }
}

/// Error type for edit application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A span extends beyond the source text or splits a character.
    #[error("span ({start}, {end}) is out of bounds for source of length {source_len}")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        source_len: usize,
    },
    /// Two edit spans overlap.
    #[error("overlapping edits: ({}, {}) and ({}, {})", first.start, first.end, second.start, second.end)]
    Overlapping { first: Span, second: Span },
}

/// Apply a batch of edits to `source`.
///
/// Edits are applied from end to start so earlier spans stay valid.
/// Insertions at the same offset keep their relative order from `edits`.
/// Overlapping edits, including an insertion inside a replaced range, are rejected.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    for edit in edits {
        if edit.span.end > source.len()
            || !source.is_char_boundary(edit.span.start)
            || !source.is_char_boundary(edit.span.end)
        {
            return Err(EditError::SpanOutOfBounds {
                start: edit.span.start,
                end: edit.span.end,
                source_len: source.len(),
            });
        }
    }

    // Stable sort keeps same-offset insertions in request order.
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.span.start, e.span.end));

    for pair in ordered.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(EditError::Overlapping {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let mut result = String::with_capacity(
        source.len() + edits.iter().map(|e| e.new_text.len()).sum::<usize>(),
    );
    let mut cursor = 0;
    for edit in ordered {
        result.push_str(&source[cursor..edit.span.start]);
        result.push_str(&edit.new_text);
        cursor = edit.span.end;
    }
    result.push_str(&source[cursor..]);
    Ok(result)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod content_hash {
        use super::*;

        #[test]
        fn same_bytes_same_hash() {
            let a = ContentHash::compute(b"package goer\n");
            let b = ContentHash::compute(b"package goer\n");
            assert_eq!(a, b);
            assert_eq!(a.0.len(), 64);
        }

        #[test]
        fn different_bytes_different_hash() {
            let a = ContentHash::compute(b"package goer\n");
            let b = ContentHash::compute(b"package goer\n\n");
            assert_ne!(a, b);
        }
    }

    mod span {
        use super::*;

        #[test]
        fn adjacent_spans_do_not_overlap() {
            assert!(!Span::new(0, 4).overlaps(&Span::new(4, 8)));
            assert!(Span::new(0, 5).overlaps(&Span::new(4, 8)));
        }

        #[test]
        fn empty_span_inside_a_range_overlaps() {
            assert!(Span::empty_at(4).overlaps(&Span::new(0, 8)));
            assert!(Span::new(0, 8).overlaps(&Span::empty_at(4)));
        }

        #[test]
        fn empty_span_at_a_boundary_does_not_overlap() {
            assert!(!Span::empty_at(0).overlaps(&Span::new(0, 8)));
            assert!(!Span::empty_at(8).overlaps(&Span::new(0, 8)));
        }
    }

    mod apply {
        use super::*;

        #[test]
        fn insert_and_replace() {
            let source = "import \"fmt\"\n";
            let edits = vec![
                TextEdit::replace(Span::new(0, 12), "import (\n\t\"fmt\"\n\t\"io\"\n)"),
                TextEdit::insert(13, "\nfunc f() {}\n"),
            ];
            let out = apply_edits(source, &edits).unwrap();
            assert_eq!(out, "import (\n\t\"fmt\"\n\t\"io\"\n)\n\nfunc f() {}\n");
        }

        #[test]
        fn same_offset_insertions_keep_order() {
            let edits = vec![TextEdit::insert(1, "b"), TextEdit::insert(1, "c")];
            assert_eq!(apply_edits("ad", &edits).unwrap(), "abcd");
        }

        #[test]
        fn overlapping_replacements_rejected() {
            let edits = vec![
                TextEdit::replace(Span::new(0, 3), "x"),
                TextEdit::replace(Span::new(2, 4), "y"),
            ];
            assert!(matches!(
                apply_edits("abcdef", &edits),
                Err(EditError::Overlapping { .. })
            ));
        }

        #[test]
        fn insertion_inside_a_replacement_rejected() {
            let edits = vec![
                TextEdit::replace(Span::new(0, 8), "x"),
                TextEdit::insert(4, "y"),
            ];
            assert!(matches!(
                apply_edits("abcdefgh", &edits),
                Err(EditError::Overlapping { .. })
            ));
        }

        #[test]
        fn out_of_bounds_rejected() {
            let edits = vec![TextEdit::insert(10, "x")];
            assert!(matches!(
                apply_edits("abc", &edits),
                Err(EditError::SpanOutOfBounds { .. })
            ));
        }

        #[test]
        fn no_edits_returns_source() {
            assert_eq!(apply_edits("abc", &[]).unwrap(), "abc");
        }
    }
}
