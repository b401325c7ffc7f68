//! Track gradient bookkeeping.
//!
//! The host reports gradient changes ahead of the train as it passes track
//! beacons. [`GradientGraph`] stores them as an ordered map from segment
//! start position to grade, where each segment runs until the next one
//! starts (the last runs to infinity). Positions with no data are flat.
//!
//! The map is kept small: equal consecutive grades are merged on insert,
//! and [`advance_past`](GradientGraph::advance_past) drops everything the
//! train has left behind.
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::{GradientGraph, Span};
//!
//! let mut graph = GradientGraph::new();
//! graph.insert_segment(100.0, 0.010); // 10‰ up from 100 m
//! graph.insert_segment(200.0, 0.0);   // flat again from 200 m
//!
//! // half of 50..150 is on the slope
//! let a = graph.acceleration_over_range(Span::new(50.0, 150.0));
//! assert!(a < 0.0);
//! ```

use alloc::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::span::Span;
use crate::units::STANDARD_GRAVITY;

type Position = OrderedFloat<f64>;

/// One gradient segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientSegment {
    /// Slope as rise over run (positive uphill).
    pub grade: f64,
    /// Acceleration the slope imposes on the train (m/s², positive downhill).
    pub influence_acceleration: f64,
}

impl GradientSegment {
    /// Segment with the given grade.
    ///
    /// Uses tan ≈ sin; the difference is negligible at railway grades.
    pub fn new(grade: f64) -> Self {
        Self {
            grade,
            influence_acceleration: -0.75 * STANDARD_GRAVITY * grade,
        }
    }
}

/// Ordered map from segment start to gradient.
#[derive(Clone, Debug, Default)]
pub struct GradientGraph {
    segments: BTreeMap<Position, GradientSegment>,
}

impl GradientGraph {
    /// Create an empty graph (flat everywhere).
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segments are stored.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in position order as `(start, segment)`.
    pub fn segments(&self) -> impl Iterator<Item = (f64, &GradientSegment)> + '_ {
        self.segments.iter().map(|(start, segment)| (start.0, segment))
    }

    /// Record that the track has `grade` from `start` onwards.
    pub fn insert_segment(&mut self, start: f64, grade: f64) {
        let key = OrderedFloat(start);

        let next = self
            .segments
            .range(key..)
            .next()
            .map(|(&next_key, segment)| (next_key, *segment));
        if let Some((next_key, next_segment)) = next {
            if next_segment.grade == grade {
                // the following segment already has this grade, just move it up
                debug_assert!(key <= next_key);
                self.segments.remove(&next_key);
                self.segments.insert(key, next_segment);
                log::trace!("gradient {grade} moved from {} to {start}", next_key.0);
                return;
            }

            if next_key == key {
                self.segments.insert(key, GradientSegment::new(grade));
                self.merge_around(key);
                log::trace!("gradient at {start} overwritten with {grade}");
                return;
            }
        }

        match self.segments.range(..key).next_back() {
            Some((previous_key, previous)) => {
                debug_assert!(*previous_key < key);
                if previous.grade == grade {
                    return;
                }
            }
            // nothing known before here means flat, so a flat segment adds nothing
            None if grade == 0.0 => return,
            None => {}
        }

        self.segments.insert(key, GradientSegment::new(grade));
        log::trace!("gradient {grade} inserted at {start}");
    }

    /// Drop the segment at `key` if its neighbour before has the same grade,
    /// and the neighbour after if it repeats the grade at `key`.
    fn merge_around(&mut self, key: Position) {
        let Some(grade) = self.segments.get(&key).map(|segment| segment.grade) else {
            return;
        };

        let after = self
            .segments
            .range((
                core::ops::Bound::Excluded(key),
                core::ops::Bound::Unbounded,
            ))
            .next()
            .map(|(&k, segment)| (k, segment.grade));
        if let Some((after_key, after_grade)) = after {
            if after_grade == grade {
                self.segments.remove(&after_key);
            }
        }

        let before_grade = self.segments.range(..key).next_back().map(|(_, s)| s.grade);
        match before_grade {
            Some(before) if before == grade => {
                self.segments.remove(&key);
            }
            None if grade == 0.0 => {
                self.segments.remove(&key);
            }
            _ => {}
        }
    }

    /// Drop segments the train has completely passed.
    ///
    /// The segment containing `position` is kept, unless it is flat: a flat
    /// segment with nothing before it carries no information.
    pub fn advance_past(&mut self, position: f64) {
        let active = match self.segments.range(..=OrderedFloat(position)).next_back() {
            Some((&key, _)) => key,
            None => match self.segments.keys().next() {
                Some(&key) => key,
                None => return,
            },
        };

        let kept = self.segments.split_off(&active);
        let dropped = self.segments.len();
        self.segments = kept;

        if let Some(entry) = self.segments.first_entry() {
            if entry.get().grade == 0.0 {
                entry.remove();
            }
        }

        if dropped > 0 {
            log::trace!("passed {dropped} gradient segments before {position}");
        }
    }

    /// Mean gradient acceleration over `range` (m/s², positive downhill).
    ///
    /// Each segment contributes its influence weighted by the fraction of
    /// `range` it covers. An empty range yields zero.
    pub fn acceleration_over_range(&self, range: Span) -> f64 {
        let total = range.length();
        if !(total > 0.0) {
            return 0.0;
        }

        let mut acceleration = 0.0;
        let mut end = f64::INFINITY;
        for (start, segment) in self.segments.iter().rev() {
            let covered = Span::new(start.0, end).overlap(&range).length();
            end = start.0;
            if !(covered > 0.0) {
                continue;
            }

            let mut weight = covered / total;
            if weight.is_nan() {
                // infinite overlap of an infinite range
                weight = 1.0;
            }
            acceleration += segment.influence_acceleration * weight;
        }
        acceleration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn starts(graph: &GradientGraph) -> Vec<f64> {
        graph.segments().map(|(start, _)| start).collect()
    }

    fn grades(graph: &GradientGraph) -> Vec<f64> {
        graph.segments().map(|(_, s)| s.grade).collect()
    }

    #[test]
    fn influence_is_downhill_positive() {
        let segment = GradientSegment::new(-0.01);
        assert!((segment.influence_acceleration - 0.75 * 9.80665 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn leading_flat_segment_ignored() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.0);
        assert!(graph.is_empty());
    }

    #[test]
    fn same_grade_after_is_pulled_forward() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(200.0, 0.01);
        graph.insert_segment(100.0, 0.01);
        assert_eq!(starts(&graph), [100.0]);
    }

    #[test]
    fn same_grade_before_is_skipped() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(150.0, 0.01);
        assert_eq!(starts(&graph), [100.0]);
    }

    #[test]
    fn overwrite_at_same_start() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, -0.02);
        graph.insert_segment(200.0, 0.005);
        assert_eq!(starts(&graph), [100.0, 200.0]);
        assert_eq!(grades(&graph), [0.01, 0.005]);
    }

    #[test]
    fn overwrite_merges_with_neighbours() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, -0.02);
        graph.insert_segment(300.0, 0.01);
        graph.insert_segment(200.0, 0.01);
        assert_eq!(starts(&graph), [100.0]);
    }

    #[test]
    fn flat_segment_after_slope_kept() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, 0.0);
        assert_eq!(grades(&graph), [0.01, 0.0]);
    }

    #[test]
    fn advance_keeps_active_segment() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, -0.01);
        graph.insert_segment(300.0, 0.02);
        graph.advance_past(250.0);
        assert_eq!(starts(&graph), [200.0, 300.0]);
    }

    #[test]
    fn advance_drops_active_flat_segment() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, 0.0);
        graph.insert_segment(300.0, 0.02);
        graph.advance_past(250.0);
        assert_eq!(starts(&graph), [300.0]);
    }

    #[test]
    fn advance_before_any_segment_keeps_everything() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, 0.02);
        graph.advance_past(50.0);
        assert_eq!(starts(&graph), [100.0, 200.0]);
    }

    #[test]
    fn advance_on_empty_graph() {
        let mut graph = GradientGraph::new();
        graph.advance_past(10.0);
        assert!(graph.is_empty());
    }

    #[test]
    fn range_inside_one_segment() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(500.0, 0.02);
        let expected = GradientSegment::new(0.01).influence_acceleration;
        assert_eq!(graph.acceleration_over_range(Span::new(200.0, 300.0)), expected);
    }

    #[test]
    fn range_split_across_segments() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(100.0, 0.01);
        graph.insert_segment(200.0, -0.01);
        let a = graph.acceleration_over_range(Span::new(150.0, 250.0));
        assert!(a.abs() < 1e-12);

        let a = graph.acceleration_over_range(Span::new(50.0, 150.0));
        let half = GradientSegment::new(0.01).influence_acceleration / 2.0;
        assert!((a - half).abs() < 1e-12);
    }

    #[test]
    fn empty_range_is_zero() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(0.0, 0.03);
        assert_eq!(graph.acceleration_over_range(Span::new(10.0, 10.0)), 0.0);
        assert_eq!(graph.acceleration_over_range(Span::new(10.0, 5.0)), 0.0);
    }

    #[test]
    fn infinite_range_gets_full_weight() {
        let mut graph = GradientGraph::new();
        graph.insert_segment(0.0, 0.01);
        let a = graph.acceleration_over_range(Span::new(10.0, f64::INFINITY));
        assert_eq!(a, GradientSegment::new(0.01).influence_acceleration);
    }
}
