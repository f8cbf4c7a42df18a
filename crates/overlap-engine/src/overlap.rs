//! The overlap predicate for both interval representations.
//!
//! - Half-open time intervals overlap iff `a.start < b.end && b.start < a.end`.
//!   Back-to-back bookings (`a.end == b.start`) are NOT overlapping.
//! - Closed date intervals overlap iff `!(a.to < b.from || b.to < a.from)`.
//!   Touching days (`a.to == b.from`) ARE overlapping: effectivity is day-level.
//!
//! The two rules encode different real-world policies and must stay separate.

use crate::interval::{ClosedDateInterval, HalfOpenTimeInterval};

/// Intersection test between two intervals of the same representation.
pub trait Overlap {
    fn overlaps(&self, other: &Self) -> bool;
}

impl Overlap for HalfOpenTimeInterval {
    fn overlaps(&self, other: &Self) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

impl Overlap for ClosedDateInterval {
    fn overlaps(&self, other: &Self) -> bool {
        !(self.to() < other.from() || other.to() < self.from())
    }
}

/// Minutes shared by two half-open intervals, 0 when they do not overlap.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn overlap_minutes(a: &HalfOpenTimeInterval, b: &HalfOpenTimeInterval) -> i64 {
    if !a.overlaps(b) {
        return 0;
    }
    let start = a.start().max(b.start());
    let end = a.end().min(b.end());
    (end - start).num_minutes()
}

/// Days shared by two closed intervals (inclusive), 0 when they do not overlap.
pub fn overlap_days(a: &ClosedDateInterval, b: &ClosedDateInterval) -> i64 {
    a.intersection(b).map_or(0, |common| common.len_days())
}
