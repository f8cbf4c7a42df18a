//! WASM bindings for overlap-engine.
//!
//! Exposes the binding, booking and participant conflict checks and the leave
//! proration to the browser console via `wasm-bindgen`. All complex types are
//! passed as JSON strings; dates are `YYYY-MM-DD`, instants ISO 8601.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p overlap-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/overlap-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/overlap_engine_wasm.wasm
//! ```

use std::collections::BTreeMap;

use overlap_engine::booking::room_free_slots;
use overlap_engine::participant::classify_participant_conflicts_with;
use overlap_engine::proration::aggregate_with;
use overlap_engine::{
    Booking, ClosedDateInterval, DateRangeBinding, HalfOpenTimeInterval, ProrationConfig,
    SeverityPolicy, SubjectCommitment,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn optional_json<T: DeserializeOwned + Default>(json: Option<String>, what: &str) -> Result<T, JsValue> {
    match json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => from_json(json, what),
        _ => Ok(T::default()),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Normalized range with the sentinel dates spelled out.
#[derive(Serialize)]
struct NormalizedRangeDto {
    from: String,
    to: String,
    open_start: bool,
    open_end: bool,
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Normalize raw optional date strings using the `0001-01-01` / `9999-12-31`
/// sentinel convention.
///
/// Returns a JSON object `{from, to, open_start, open_end}`.
#[wasm_bindgen(js_name = "normalizeDateRange")]
pub fn normalize_date_range(from: Option<String>, to: Option<String>) -> Result<String, JsValue> {
    let range = overlap_engine::normalize_date_range(from.as_deref(), to.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    to_json(&NormalizedRangeDto {
        from: range.from().to_string(),
        to: range.to().to_string(),
        open_start: range.is_open_start(),
        open_end: range.is_open_end(),
    })
}

/// Find the existing policy bindings that overlap a candidate effective range.
///
/// `candidate_json` is `{from, to}` (either may be null for unbounded);
/// `others_json` is an array of `{id, subject_id, policy_id?, range}`.
/// Returns the overlapping bindings as a JSON array.
#[wasm_bindgen(js_name = "checkDateRangeOverlap")]
pub fn check_date_range_overlap(
    candidate_json: &str,
    others_json: &str,
    exclude_id: Option<String>,
) -> Result<String, JsValue> {
    let candidate: ClosedDateInterval = from_json(candidate_json, "candidate range")?;
    let others: Vec<DateRangeBinding> = from_json(others_json, "bindings")?;

    let conflicts = overlap_engine::check_date_range_overlap(&candidate, &others, exclude_id.as_deref());

    to_json(&conflicts)
}

/// Find confirmed bookings of a room that collide with a candidate slot.
///
/// `candidate_json` is `{start, end}`; `bookings_json` is an array of
/// `{id, resource_id, interval: {start, end}}`. Returns an array of
/// `{booking, overlap_minutes}`.
#[wasm_bindgen(js_name = "checkBookingOverlap")]
pub fn check_booking_overlap(
    candidate_json: &str,
    resource_id: &str,
    bookings_json: &str,
) -> Result<String, JsValue> {
    let candidate: HalfOpenTimeInterval = from_json(candidate_json, "candidate slot")?;
    let bookings: Vec<Booking> = from_json(bookings_json, "bookings")?;

    let conflicts = overlap_engine::check_booking_overlap(&candidate, resource_id, &bookings);

    to_json(&conflicts)
}

/// Free slots of a room inside a window, given its confirmed bookings.
///
/// Returns an array of `{start, end}`.
#[wasm_bindgen(js_name = "findRoomFreeSlots")]
pub fn find_room_free_slots(
    resource_id: &str,
    bookings_json: &str,
    window_json: &str,
) -> Result<String, JsValue> {
    let bookings: Vec<Booking> = from_json(bookings_json, "bookings")?;
    let window: HalfOpenTimeInterval = from_json(window_json, "window")?;

    to_json(&room_free_slots(resource_id, &bookings, &window))
}

/// Grade each participant's overlapping commitments.
///
/// `per_subject_json` maps subject ids to arrays of commitments
/// `{meeting_id?, interval, other_approval_state, subject_response?, subject_role?}`.
/// `policy_json` optionally overrides the default severity table.
/// Returns `{subjects, has_conflicts, summary}`.
#[wasm_bindgen(js_name = "classifyParticipantConflicts")]
pub fn classify_participant_conflicts(
    candidate_json: &str,
    per_subject_json: &str,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    let candidate: HalfOpenTimeInterval = from_json(candidate_json, "candidate slot")?;
    let per_subject: BTreeMap<String, Vec<SubjectCommitment>> =
        from_json(per_subject_json, "commitments")?;
    let policy: SeverityPolicy = optional_json(policy_json, "severity policy")?;

    to_json(&classify_participant_conflicts_with(&candidate, &per_subject, &policy))
}

/// Prorate leave segments into day buckets of a reporting window.
///
/// `segments_json` is an array of tagged segments (`kind` is `MULTI_DAY`,
/// `SINGLE_DAY_SLOT` or `SUB_DAY_RANGE`); `window_json` is `{from, to}`;
/// `config_json` optionally overrides the proration defaults.
/// Returns `{window, buckets: [{key, value}], total}`.
#[wasm_bindgen(js_name = "aggregateAmounts")]
pub fn aggregate_amounts(
    segments_json: &str,
    window_json: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let segments: Vec<overlap_engine::AmountSegment> = from_json(segments_json, "segments")?;
    let window: ClosedDateInterval = from_json(window_json, "window")?;
    let config: ProrationConfig = optional_json(config_json, "proration config")?;

    let result = aggregate_with(&segments, &window, &config).map_err(|e| JsValue::from_str(&e.to_string()))?;

    to_json(&result)
}
