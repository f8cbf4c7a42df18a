//! Room and resource double-booking detection.
//!
//! The checker answers "would this booking collide with an already-approved
//! booking of the same room". It never rejects anything itself; the caller
//! decides whether to block submission or show the list.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::interval::HalfOpenTimeInterval;
use crate::overlap::{overlap_minutes, Overlap};

/// A confirmed booking of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub resource_id: String,
    pub interval: HalfOpenTimeInterval,
}

/// An existing booking that collides with the candidate slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConflict<'a> {
    pub booking: &'a Booking,
    pub overlap_minutes: i64,
}

/// Return the bookings of `resource_id` that overlap `candidate`.
///
/// `others` should already be narrowed to confirmed bookings of the resource;
/// bookings of any other resource are ignored rather than reported.
/// Back-to-back bookings do not conflict. Results are ordered by start time.
pub fn check_booking_overlap<'a>(
    candidate: &HalfOpenTimeInterval,
    resource_id: &str,
    others: &'a [Booking],
) -> Vec<BookingConflict<'a>> {
    let mut conflicts: Vec<BookingConflict<'a>> = others
        .iter()
        .filter(|b| {
            let same = b.resource_id == resource_id;
            if !same {
                tracing::trace!(booking = %b.id, resource = %b.resource_id, "skipping booking of another resource");
            }
            same
        })
        .filter(|b| candidate.overlaps(&b.interval))
        .map(|booking| BookingConflict {
            booking,
            overlap_minutes: overlap_minutes(candidate, &booking.interval),
        })
        .collect();

    conflicts.sort_by_key(|c| (c.booking.interval.start(), c.booking.interval.end()));

    tracing::debug!(
        resource = resource_id,
        scanned = others.len(),
        conflicts = conflicts.len(),
        "checked booking overlap"
    );

    conflicts
}

/// Stretches of `window` in which `resource_id` has no booking, in order.
///
/// Overlapping and back-to-back bookings leave no gap between them.
pub fn room_free_slots(
    resource_id: &str,
    bookings: &[Booking],
    window: &HalfOpenTimeInterval,
) -> Vec<HalfOpenTimeInterval> {
    let mut booked: Vec<HalfOpenTimeInterval> = bookings
        .iter()
        .filter(|b| b.resource_id == resource_id)
        .filter_map(|b| b.interval.intersection(window))
        .collect();
    booked.sort_unstable();

    let (mut free, free_from) =
        booked
            .iter()
            .fold((Vec::new(), window.start()), |(mut free, free_from), slot| {
                free.extend(HalfOpenTimeInterval::new(free_from, slot.start()).ok());
                (free, free_from.max(slot.end()))
            });
    free.extend(HalfOpenTimeInterval::new(free_from, window.end()).ok());

    tracing::debug!(
        resource = resource_id,
        booked = booked.len(),
        free = free.len(),
        "computed room free slots"
    );

    free
}

/// The earliest free stretch of `resource_id` in `window` lasting at least
/// `min_length`.
pub fn first_free_slot(
    resource_id: &str,
    bookings: &[Booking],
    window: &HalfOpenTimeInterval,
    min_length: Duration,
) -> Option<HalfOpenTimeInterval> {
    room_free_slots(resource_id, bookings, window)
        .into_iter()
        .find(|slot| slot.duration() >= min_length)
}
