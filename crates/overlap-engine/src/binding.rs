//! Effective-date binding conflicts.
//!
//! A binding ties a subject (an employee) to a policy (a shift type, an
//! overtime rule, ...) over a closed date range. No two bindings of the same
//! subject may overlap; touching ranges (`a.to == b.from`) already collide
//! because effectivity is day-level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::interval::ClosedDateInterval;
use crate::overlap::{overlap_days, Overlap};

/// One policy binding of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeBinding {
    /// Identifier of the binding record itself.
    pub id: String,
    /// The subject the binding applies to.
    #[serde(default)]
    pub subject_id: String,
    /// The policy bound to the subject; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    /// Effective range, already normalized with sentinels.
    pub range: ClosedDateInterval,
}

/// Two bindings of the same subject whose ranges overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingOverlap<'a> {
    pub first: &'a DateRangeBinding,
    pub second: &'a DateRangeBinding,
    pub overlap_days: i64,
}

/// Return the bindings in `others` whose range overlaps `candidate`.
///
/// `others` is the candidate subject's full set of bindings. The binding whose
/// id equals `exclude_id` (the record being edited) never conflicts with
/// itself. Results keep the input order.
pub fn check_date_range_overlap<'a>(
    candidate: &ClosedDateInterval,
    others: &'a [DateRangeBinding],
    exclude_id: Option<&str>,
) -> Vec<&'a DateRangeBinding> {
    let conflicts: Vec<&DateRangeBinding> = others
        .iter()
        .filter(|b| exclude_id != Some(b.id.as_str()))
        .filter(|b| candidate.overlaps(&b.range))
        .collect();

    tracing::debug!(
        from = %candidate.from(),
        to = %candidate.to(),
        scanned = others.len(),
        conflicts = conflicts.len(),
        "checked date-range binding overlap"
    );

    conflicts
}

/// Audit a whole roster: every pair of same-subject bindings that overlap.
///
/// Pairs are reported once, ordered by subject and then by the start of the
/// earlier binding.
pub fn find_overlapping_bindings(bindings: &[DateRangeBinding]) -> Vec<BindingOverlap<'_>> {
    let mut sorted: Vec<&DateRangeBinding> = bindings.iter().collect();
    sorted.sort_by(|a, b| {
        (a.subject_id.as_str(), a.range.from(), a.range.to(), a.id.as_str()).cmp(&(
            b.subject_id.as_str(),
            b.range.from(),
            b.range.to(),
            b.id.as_str(),
        ))
    });

    let mut overlaps = Vec::new();
    for (i, first) in sorted.iter().enumerate() {
        for second in &sorted[i + 1..] {
            if second.subject_id != first.subject_id {
                break;
            }
            // Sorted by start: once a later binding starts after `first` ends,
            // none of the following ones can overlap it either.
            if second.range.from() > first.range.to() {
                break;
            }
            if first.range.overlaps(&second.range) {
                overlaps.push(BindingOverlap {
                    first: *first,
                    second: *second,
                    overlap_days: overlap_days(&first.range, &second.range),
                });
            }
        }
    }

    tracing::debug!(
        bindings = bindings.len(),
        overlaps = overlaps.len(),
        "audited binding roster"
    );

    overlaps
}

/// The binding of `subject_id` in effect on `day`.
///
/// With a consistent roster at most one binding matches. If the roster is
/// inconsistent, the binding that started most recently wins.
pub fn binding_active_on<'a>(
    bindings: &'a [DateRangeBinding],
    subject_id: &str,
    day: NaiveDate,
) -> Option<&'a DateRangeBinding> {
    bindings
        .iter()
        .filter(|b| b.subject_id == subject_id && b.range.contains(day))
        .max_by_key(|b| b.range.from())
}
