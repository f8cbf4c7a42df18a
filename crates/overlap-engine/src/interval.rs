//! Interval primitives.
//!
//! Two representations are used across the engine and they are deliberately
//! kept apart:
//!
//! - [`ClosedDateInterval`] -- `[from, to]` at day granularity, used for policy
//!   effective ranges. Absent bounds normalize to the [`min_sentinel`] /
//!   [`max_sentinel`] dates so comparisons are total.
//! - [`HalfOpenTimeInterval`] -- `[start, end)` over UTC instants, used for room
//!   bookings and meeting slots.
//!
//! Both types can only be constructed in a valid state (`from <= to`,
//! `start < end`); every checker downstream relies on that.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Lower sentinel substituted for an absent `from` bound (`0001-01-01`).
pub fn min_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Upper sentinel substituted for an absent `to` bound (`9999-12-31`).
pub fn max_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

// ---------------------------------------------------------------------------
// Raw string parsing
// ---------------------------------------------------------------------------

/// Parse a calendar date from a raw string.
///
/// Accepts `YYYY-MM-DD`, an RFC 3339 datetime (the date in its own offset is
/// kept), or a naive `YYYY-MM-DDTHH:MM:SS` datetime.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.date())
        .map_err(|e| EngineError::InvalidDate(format!("'{}': {}", s, e)))
}

/// Parse an ISO 8601 instant into `DateTime<Utc>`.
///
/// Accepts both RFC 3339 (with offset, e.g. "2026-02-17T14:00:00+07:00") and
/// naive datetimes (e.g. "2026-02-17T14:00:00"), which are interpreted as UTC.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| EngineError::InvalidDate(format!("'{}': {}", s, e)))
}

/// Normalize raw optional date strings into a [`ClosedDateInterval`].
///
/// `None` and empty strings are treated as unbounded and replaced with the
/// sentinel dates. An inverted range is rejected, never swapped.
pub fn normalize_date_range(from: Option<&str>, to: Option<&str>) -> Result<ClosedDateInterval> {
    let from = non_empty(from).map(parse_date).transpose()?;
    let to = non_empty(to).map(parse_date).transpose()?;
    ClosedDateInterval::from_optional(from, to)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// ClosedDateInterval
// ---------------------------------------------------------------------------

/// A closed date interval `[from, to]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DateRangeInput", into = "DateRangeInput")]
pub struct ClosedDateInterval {
    from: NaiveDate,
    to: NaiveDate,
}

/// Wire form of a [`ClosedDateInterval`]: optional date strings, `null` or
/// `""` meaning unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeInput {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl TryFrom<DateRangeInput> for ClosedDateInterval {
    type Error = EngineError;

    fn try_from(raw: DateRangeInput) -> Result<Self> {
        normalize_date_range(raw.from.as_deref(), raw.to.as_deref())
    }
}

impl From<ClosedDateInterval> for DateRangeInput {
    fn from(range: ClosedDateInterval) -> Self {
        Self {
            from: (!range.is_open_start()).then(|| range.from.format("%Y-%m-%d").to_string()),
            to: (!range.is_open_end()).then(|| range.to.format("%Y-%m-%d").to_string()),
        }
    }
}

impl ClosedDateInterval {
    /// Build a closed interval, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(EngineError::InvalidInterval(format!(
                "from {} is after to {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Build from optional bounds, substituting sentinels for absent ends.
    pub fn from_optional(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        Self::new(
            from.unwrap_or_else(min_sentinel),
            to.unwrap_or_else(max_sentinel),
        )
    }

    /// A range that is effective from `from` onwards, forever.
    pub fn starting(from: NaiveDate) -> Self {
        Self {
            from,
            to: max_sentinel().max(from),
        }
    }

    /// A range covering exactly one day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// True when the lower bound is the minimum sentinel.
    pub fn is_open_start(&self) -> bool {
        self.from <= min_sentinel()
    }

    /// True when the upper bound is the maximum sentinel ("forever").
    pub fn is_open_end(&self) -> bool {
        self.to >= max_sentinel()
    }

    pub fn is_open_ended(&self) -> bool {
        self.is_open_start() || self.is_open_end()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Number of days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// The common sub-range of two intervals, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let from = self.from.max(other.from);
        let to = self.to.min(other.to);
        (from <= to).then_some(Self { from, to })
    }

    /// Iterate every day in the interval in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

// ---------------------------------------------------------------------------
// HalfOpenTimeInterval
// ---------------------------------------------------------------------------

/// A half-open time interval `[start, end)` over UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeInput", into = "TimeRangeInput")]
pub struct HalfOpenTimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Wire form of a [`HalfOpenTimeInterval`]: two ISO 8601 instant strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeInput {
    pub start: String,
    pub end: String,
}

impl TryFrom<TimeRangeInput> for HalfOpenTimeInterval {
    type Error = EngineError;

    fn try_from(raw: TimeRangeInput) -> Result<Self> {
        Self::parse(&raw.start, &raw.end)
    }
}

impl From<HalfOpenTimeInterval> for TimeRangeInput {
    fn from(interval: HalfOpenTimeInterval) -> Self {
        Self {
            start: interval.start.to_rfc3339(),
            end: interval.end.to_rfc3339(),
        }
    }
}

impl HalfOpenTimeInterval {
    /// Build a half-open interval, rejecting zero-length and inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds with [`parse_instant`] and validate.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_instant(start)?, parse_instant(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// True when `instant` falls in `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The common part of two intervals. Touching intervals share nothing.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }
}
