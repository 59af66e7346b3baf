//! Immutable source text and the half-open byte ranges nodes keep into it.

use std::fmt;
use std::sync::Arc;

/// Half-open byte range into the source text.
///
/// Invariant: `start <= end`, and both ends fall on UTF-8 character boundaries
/// of the source the span was produced from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    /// Zero-length span positioned at `at`.
    pub fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The decoded input a document was parsed from.
///
/// Never mutated after parsing starts; every parsed node reads its HTML
/// as a slice of this buffer until it is edited. Clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct Source {
    text: Arc<str>,
}

impl Source {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn slice(&self, span: Span) -> &str {
        debug_assert!(self.text.is_char_boundary(span.start));
        debug_assert!(self.text.is_char_boundary(span.end));
        &self.text[span.start..span.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_nested_ranges() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(Span::new(2, 5)));
        assert!(outer.contains(Span::empty_at(10)));
        assert!(!outer.contains(Span::new(5, 11)));
    }

    #[test]
    fn source_slices_utf8_text() {
        let source = Source::new("<p>café</p>");
        assert_eq!(source.slice(Span::new(3, 8)), "café");
        assert_eq!(source.len(), 12);
    }

    #[test]
    fn clones_share_the_buffer() {
        let source = Source::new("<p>x</p>");
        let copy = source.clone();
        assert!(Arc::ptr_eq(&source.text, &copy.text));
    }
}
