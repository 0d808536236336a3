//! Offset spans and interval normalization.
//!
//! A [`Span`] is a half-open `[start, end)` interval of offsets into a
//! document. Offsets are unsigned, so non-negativity holds by construction;
//! the remaining invariant (`end >= start`) is validated at every
//! construction and mutation. Degenerate spans (`start == end`) are allowed.
//!
//! [`normalize_spans`] reduces an arbitrary span list to the minimal
//! ascending, non-overlapping cover of the same offsets, the aggregate form
//! that span match policies and duplicate detection operate on.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` offset interval.
///
/// Ordered by `(start, end)` ascending. Construct through [`Span::new`];
/// mutators revalidate and deserialization goes through the same check, so
/// a `Span` is never in an invalid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    start: usize,
    end: usize,
}

/// Unvalidated wire form of [`Span`].
#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
}

impl TryFrom<RawSpan> for Span {
    type Error = Error;

    fn try_from(raw: RawSpan) -> Result<Self> {
        Span::new(raw.start, raw.end)
    }
}

impl Span {
    /// Create a new span.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] when `end < start`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if end < start {
            return Err(Error::invalid_span(start, end));
        }
        Ok(Self { start, end })
    }

    /// Start offset (inclusive).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of offsets covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for degenerate `start == end` spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Set the start offset, revalidating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] when the new start exceeds the end.
    pub fn set_start(&mut self, start: usize) -> Result<()> {
        if self.end < start {
            return Err(Error::invalid_span(start, self.end));
        }
        self.start = start;
        Ok(())
    }

    /// Set the end offset, revalidating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] when the new end precedes the start.
    pub fn set_end(&mut self, end: usize) -> Result<()> {
        if end < self.start {
            return Err(Error::invalid_span(self.start, end));
        }
        self.end = end;
        Ok(())
    }

    /// Set both offsets at once, revalidating.
    ///
    /// Unlike [`set_start`](Self::set_start) followed by
    /// [`set_end`](Self::set_end), the new interval need not overlap the
    /// old one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] when `end < start`.
    pub fn set_range(&mut self, start: usize, end: usize) -> Result<()> {
        if end < start {
            return Err(Error::invalid_span(start, end));
        }
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Check if two spans overlap.
    ///
    /// Half-open semantics: touching endpoints do not overlap, so
    /// `[25, 30)` does not overlap `[30, 39)`.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span fully contains `other`.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Check if a single offset falls inside the span.
    #[must_use]
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}

/// Merge two spans unless they are strictly disjoint.
///
/// Spans that overlap or touch (one's end meets the other's start) collapse
/// into one `[min(start), max(end)]` span; strictly disjoint spans are
/// returned as-is, sorted ascending.
#[must_use]
pub fn reduce_spans(a: Span, b: Span) -> Vec<Span> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo.end >= hi.start {
        vec![Span {
            start: lo.start,
            end: lo.end.max(hi.end),
        }]
    } else {
        vec![lo, hi]
    }
}

/// Reduce a span list to its minimal ascending non-overlapping cover.
///
/// Sorts by `(start, end)` and merges every span whose start does not pass
/// the running maximum end. The result covers exactly the same offsets as
/// the input; adjacent (touching) spans are merged.
#[must_use]
pub fn normalize_spans(spans: &[Span]) -> Vec<Span> {
    let mut sorted: Vec<Span> = spans.to_vec();
    sorted.sort();

    let mut result: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match result.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => result.push(span),
        }
    }
    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_span() -> impl Strategy<Value = Span> {
        (0usize..200, 0usize..50).prop_map(|(start, len)| Span::new(start, start + len).unwrap())
    }

    proptest! {
        #[test]
        fn normalize_output_is_sorted_and_disjoint(spans in prop::collection::vec(arb_span(), 0..20)) {
            let normalized = normalize_spans(&spans);
            for pair in normalized.windows(2) {
                // Strictly disjoint and ascending: no overlap, no touching
                prop_assert!(pair[0].end() < pair[1].start());
            }
        }

        #[test]
        fn normalize_preserves_covered_offsets(spans in prop::collection::vec(arb_span(), 0..20)) {
            let normalized = normalize_spans(&spans);
            for offset in 0usize..260 {
                let before = spans.iter().any(|s| s.contains_offset(offset));
                let after = normalized.iter().any(|s| s.contains_offset(offset));
                prop_assert_eq!(before, after);
            }
        }

        #[test]
        fn normalize_is_idempotent(spans in prop::collection::vec(arb_span(), 0..20)) {
            let once = normalize_spans(&spans);
            let twice = normalize_spans(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
