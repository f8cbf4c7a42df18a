//! # overlap-engine
//!
//! Interval overlap and conflict classification for HR scheduling.
//!
//! Every operation is a pure, synchronous function over values supplied by the
//! caller: the engine performs no I/O and keeps no state, so it can be called
//! from any number of threads at once and its results can be cached freely.
//!
//! ## Modules
//!
//! - [`interval`] — closed date ranges with sentinel bounds, half-open time ranges
//! - [`overlap`] — the two overlap predicates (closed touching, half-open not)
//! - [`binding`] — effective-date policy binding conflicts
//! - [`booking`] — room double-booking detection and room free slots
//! - [`participant`] — participant conflict severity classification
//! - [`proration`] — leave amount proration into day buckets
//! - [`calendar`] — working-day calendar
//! - [`error`] — Error types

pub mod binding;
pub mod booking;
pub mod calendar;
pub mod error;
pub mod interval;
pub mod overlap;
pub mod participant;
pub mod proration;

pub use binding::{check_date_range_overlap, DateRangeBinding};
pub use booking::{check_booking_overlap, Booking, BookingConflict};
pub use error::EngineError;
pub use interval::{normalize_date_range, parse_instant, ClosedDateInterval, HalfOpenTimeInterval};
pub use overlap::Overlap;
pub use participant::{
    classify_participant_conflicts, ConflictResult, ConflictSeverity, SeverityPolicy,
    SubjectCommitment,
};
pub use proration::{aggregate, AmountSegment, BucketedResult, ProrationConfig};
