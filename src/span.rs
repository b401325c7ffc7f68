//! Position intervals along the track.

/// Interval `[start, end)` along the track, in metres.
///
/// A span whose end does not lie after its start is empty; its
/// [`length`](Self::length) is zero or negative.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start position (m).
    pub start: f64,
    /// End position (m).
    pub end: f64,
}

impl Span {
    /// Create a span from `start` to `end`.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// `end - start`; not positive for empty spans.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Intersection of two spans. May be empty.
    pub fn overlap(&self, other: &Span) -> Span {
        Span::new(self.start.max(other.start), self.end.min(other.end))
    }
}
