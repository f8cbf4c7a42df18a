//! Tests for room double-booking detection and room free slots.

use chrono::Duration;
use overlap_engine::booking::{first_free_slot, room_free_slots};
use overlap_engine::{check_booking_overlap, Booking, HalfOpenTimeInterval};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn slot(start: &str, end: &str) -> HalfOpenTimeInterval {
    HalfOpenTimeInterval::parse(start, end).unwrap()
}

fn booking(id: &str, room: &str, start: &str, end: &str) -> Booking {
    Booking {
        id: id.to_string(),
        resource_id: room.to_string(),
        interval: slot(start, end),
    }
}

// ── check_booking_overlap ───────────────────────────────────────────────────

#[test]
fn back_to_back_meeting_is_allowed() {
    let candidate = slot("2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z");
    let existing = vec![booking("b1", "room-a", "2024-03-04T13:00:00Z", "2024-03-04T14:00:00Z")];

    let conflicts = check_booking_overlap(&candidate, "room-a", &existing);

    assert!(conflicts.is_empty(), "touching bookings must not collide");
}

#[test]
fn overlapping_booking_is_reported_with_minutes() {
    let candidate = slot("2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z");
    let existing = vec![booking("b1", "room-a", "2024-03-04T14:45:00Z", "2024-03-04T16:00:00Z")];

    let conflicts = check_booking_overlap(&candidate, "room-a", &existing);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].booking.id, "b1");
    assert_eq!(conflicts[0].overlap_minutes, 15);
}

#[test]
fn other_rooms_are_ignored() {
    let candidate = slot("2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z");
    let existing = vec![booking("b1", "room-b", "2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z")];

    assert!(check_booking_overlap(&candidate, "room-a", &existing).is_empty());
}

#[test]
fn conflicts_are_sorted_by_start() {
    let candidate = slot("2024-03-04T08:00:00Z", "2024-03-04T18:00:00Z");
    let existing = vec![
        booking("late", "room-a", "2024-03-04T16:00:00Z", "2024-03-04T17:00:00Z"),
        booking("early", "room-a", "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z"),
        booking("noon", "room-a", "2024-03-04T12:00:00Z", "2024-03-04T13:00:00Z"),
    ];

    let conflicts = check_booking_overlap(&candidate, "room-a", &existing);

    let ids: Vec<&str> = conflicts.iter().map(|c| c.booking.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "noon", "late"]);
}

#[test]
fn no_bookings_no_conflicts() {
    let candidate = slot("2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z");
    assert!(check_booking_overlap(&candidate, "room-a", &[]).is_empty());
}

// ── room_free_slots ─────────────────────────────────────────────────────────

fn morning() -> HalfOpenTimeInterval {
    slot("2024-03-04T08:00:00Z", "2024-03-04T12:00:00Z")
}

#[test]
fn free_slots_skip_booked_periods_of_that_room() {
    let bookings = vec![
        booking("b1", "room-a", "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z"),
        booking("b2", "room-a", "2024-03-04T10:00:00Z", "2024-03-04T10:30:00Z"),
        booking("b3", "room-b", "2024-03-04T08:00:00Z", "2024-03-04T12:00:00Z"),
    ];

    let free = room_free_slots("room-a", &bookings, &morning());

    assert_eq!(
        free,
        vec![
            slot("2024-03-04T08:00:00Z", "2024-03-04T09:00:00Z"),
            slot("2024-03-04T10:30:00Z", "2024-03-04T12:00:00Z"),
        ]
    );
}

#[test]
fn unbooked_room_is_free_for_the_whole_window() {
    assert_eq!(room_free_slots("room-a", &[], &morning()), vec![morning()]);
}

#[test]
fn overlapping_bookings_leave_one_gap_after_the_later_end() {
    let bookings = vec![
        booking("b1", "room-a", "2024-03-04T09:00:00Z", "2024-03-04T11:00:00Z"),
        booking("b2", "room-a", "2024-03-04T08:30:00Z", "2024-03-04T09:30:00Z"),
    ];

    let free = room_free_slots("room-a", &bookings, &morning());

    assert_eq!(
        free,
        vec![
            slot("2024-03-04T08:00:00Z", "2024-03-04T08:30:00Z"),
            slot("2024-03-04T11:00:00Z", "2024-03-04T12:00:00Z"),
        ]
    );
}

#[test]
fn bookings_past_the_window_are_clipped() {
    let bookings = vec![
        booking("b1", "room-a", "2024-03-04T06:00:00Z", "2024-03-04T09:00:00Z"),
        booking("b2", "room-a", "2024-03-04T11:00:00Z", "2024-03-04T14:00:00Z"),
        booking("b3", "room-a", "2024-03-04T12:00:00Z", "2024-03-04T13:00:00Z"),
    ];

    let free = room_free_slots("room-a", &bookings, &morning());

    assert_eq!(free, vec![slot("2024-03-04T09:00:00Z", "2024-03-04T11:00:00Z")]);
}

#[test]
fn fully_booked_room_has_no_free_slot() {
    let bookings = vec![booking("b1", "room-a", "2024-03-04T07:00:00Z", "2024-03-04T13:00:00Z")];
    assert!(room_free_slots("room-a", &bookings, &morning()).is_empty());
}

#[test]
fn first_free_slot_needs_the_minimum_length() {
    let bookings = vec![
        booking("b1", "room-a", "2024-03-04T08:30:00Z", "2024-03-04T10:00:00Z"),
        booking("b2", "room-a", "2024-03-04T10:45:00Z", "2024-03-04T11:00:00Z"),
    ];

    let first = first_free_slot("room-a", &bookings, &morning(), Duration::minutes(60)).unwrap();
    assert_eq!(first, slot("2024-03-04T11:00:00Z", "2024-03-04T12:00:00Z"));

    assert!(first_free_slot("room-a", &bookings, &morning(), Duration::minutes(61)).is_none());
}
