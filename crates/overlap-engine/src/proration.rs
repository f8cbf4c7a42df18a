//! Bucketed proration of leave amounts over a reporting window.
//!
//! Each [`AmountSegment`] is spread over the day buckets of the window:
//!
//! - `MULTI_DAY` spans are divided evenly over their working days (weekends and
//!   configured holidays neither count in the denominator nor receive value),
//!   and only the working days inside the window are credited.
//! - `SINGLE_DAY_SLOT` half-days credit their one day.
//! - `SUB_DAY_RANGE` ranges credit the local calendar day of their start.
//!
//! A segment never distributes more than its declared (or defaulted) amount,
//! and segments outside the window are dropped silently.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendar;
use crate::error::{EngineError, Result};
use crate::interval::{parse_date, parse_instant, ClosedDateInterval};

/// Defaults and calendar used while prorating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProrationConfig {
    /// Amount credited per working day when a multi-day segment has no total.
    pub hours_per_day: f64,
    /// Amount credited for a half-day slot without a total.
    pub half_day_hours: f64,
    /// Zone whose calendar decides which day a sub-day range belongs to.
    pub timezone: Tz,
    /// Extra non-working days on top of weekends.
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for ProrationConfig {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            half_day_hours: 4.0,
            timezone: Tz::UTC,
            holidays: BTreeSet::new(),
        }
    }
}

impl ProrationConfig {
    pub fn calendar(&self) -> WorkCalendar {
        WorkCalendar::new(self.holidays.iter().copied())
    }
}

/// An amount-bearing span of time, e.g. one approved leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentInput", into = "SegmentInput")]
pub enum AmountSegment {
    MultiDay {
        from: NaiveDate,
        to: NaiveDate,
        total_amount: Option<f64>,
    },
    SingleDaySlot {
        day: NaiveDate,
        total_amount: Option<f64>,
    },
    SubDayRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        total_amount: Option<f64>,
    },
}

impl AmountSegment {
    pub fn total_amount(&self) -> Option<f64> {
        match self {
            Self::MultiDay { total_amount, .. }
            | Self::SingleDaySlot { total_amount, .. }
            | Self::SubDayRange { total_amount, .. } => *total_amount,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::MultiDay { .. } => SegmentKind::MultiDay,
            Self::SingleDaySlot { .. } => SegmentKind::SingleDaySlot,
            Self::SubDayRange { .. } => SegmentKind::SubDayRange,
        }
    }

    /// Check bounds and amount; called on every segment before aggregating.
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.total_amount() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(EngineError::MalformedSegment(format!(
                    "{} segment has invalid total_amount {}",
                    self.kind(),
                    amount
                )));
            }
        }
        match self {
            Self::MultiDay { from, to, .. } if from > to => Err(EngineError::InvalidInterval(
                format!("MULTI_DAY segment from {} is after to {}", from, to),
            )),
            Self::SubDayRange { start, end, .. } if start >= end => {
                Err(EngineError::InvalidInterval(format!(
                    "SUB_DAY_RANGE segment start {} is not before end {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Discriminant of an [`AmountSegment`] on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    MultiDay,
    SingleDaySlot,
    SubDayRange,
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::MultiDay => "MULTI_DAY",
            Self::SingleDaySlot => "SINGLE_DAY_SLOT",
            Self::SubDayRange => "SUB_DAY_RANGE",
        };
        f.write_str(label)
    }
}

/// Flat wire record for a segment. Which fields are required depends on `kind`;
/// a missing one is reported as [`EngineError::MalformedSegment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentInput {
    pub kind: Option<SegmentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, alias = "totalAmount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

fn required<'a>(kind: SegmentKind, name: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::MalformedSegment(format!("{} segment is missing `{}`", kind, name)))
}

impl TryFrom<SegmentInput> for AmountSegment {
    type Error = EngineError;

    fn try_from(raw: SegmentInput) -> Result<Self> {
        let kind = raw
            .kind
            .ok_or_else(|| EngineError::MalformedSegment("segment is missing `kind`".to_string()))?;
        let total_amount = raw.total_amount;
        let segment = match kind {
            SegmentKind::MultiDay => Self::MultiDay {
                from: parse_date(required(kind, "from", &raw.from)?)?,
                to: parse_date(required(kind, "to", &raw.to)?)?,
                total_amount,
            },
            SegmentKind::SingleDaySlot => Self::SingleDaySlot {
                day: parse_date(required(kind, "day", &raw.day)?)?,
                total_amount,
            },
            SegmentKind::SubDayRange => Self::SubDayRange {
                start: parse_instant(required(kind, "start", &raw.start)?)?,
                end: parse_instant(required(kind, "end", &raw.end)?)?,
                total_amount,
            },
        };
        segment.validate()?;
        Ok(segment)
    }
}

impl From<AmountSegment> for SegmentInput {
    fn from(segment: AmountSegment) -> Self {
        let kind = Some(segment.kind());
        match segment {
            AmountSegment::MultiDay {
                from,
                to,
                total_amount,
            } => Self {
                kind,
                from: Some(from.to_string()),
                to: Some(to.to_string()),
                total_amount,
                ..Self::default()
            },
            AmountSegment::SingleDaySlot { day, total_amount } => Self {
                kind,
                day: Some(day.to_string()),
                total_amount,
                ..Self::default()
            },
            AmountSegment::SubDayRange {
                start,
                end,
                total_amount,
            } => Self {
                kind,
                start: Some(start.to_rfc3339()),
                end: Some(end.to_rfc3339()),
                total_amount,
                ..Self::default()
            },
        }
    }
}

/// One calendar day of the reporting window and its accumulated amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: NaiveDate,
    pub value: f64,
}

/// Period used when rolling day buckets up for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Day,
    /// ISO weeks, keyed by their Monday.
    Week,
    /// Calendar months, keyed by their first day.
    Month,
}

impl Granularity {
    fn period_start(self, day: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => day,
            Self::Week => day - Duration::days(i64::from(day.weekday().num_days_from_monday())),
            Self::Month => day.with_day(1).unwrap_or(day),
        }
    }
}

/// Day buckets for the whole window plus their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedResult {
    pub window: ClosedDateInterval,
    pub buckets: Vec<Bucket>,
    pub total: f64,
}

impl BucketedResult {
    fn empty(window: &ClosedDateInterval) -> Self {
        Self {
            window: *window,
            buckets: window.days().map(|key| Bucket { key, value: 0.0 }).collect(),
            total: 0.0,
        }
    }

    fn add(&mut self, day: NaiveDate, amount: f64) {
        if !self.window.contains(day) {
            return;
        }
        let index = (day - self.window.from()).num_days() as usize;
        if let Some(bucket) = self.buckets.get_mut(index) {
            bucket.value += amount;
        }
    }

    pub fn value_on(&self, day: NaiveDate) -> Option<f64> {
        if !self.window.contains(day) {
            return None;
        }
        let index = (day - self.window.from()).num_days() as usize;
        self.buckets.get(index).map(|b| b.value)
    }

    /// Sum the day buckets into coarser periods, in order.
    pub fn rollup(&self, granularity: Granularity) -> Vec<Bucket> {
        let mut periods: Vec<Bucket> = Vec::new();
        for bucket in &self.buckets {
            let key = granularity.period_start(bucket.key);
            match periods.last_mut() {
                Some(last) if last.key == key => last.value += bucket.value,
                _ => periods.push(Bucket {
                    key,
                    value: bucket.value,
                }),
            }
        }
        periods
    }
}

/// Prorate `segments` over `window` with the default [`ProrationConfig`].
pub fn aggregate(segments: &[AmountSegment], window: &ClosedDateInterval) -> Result<BucketedResult> {
    aggregate_with(segments, window, &ProrationConfig::default())
}

/// Prorate `segments` over `window`.
///
/// The window must be bounded on both ends. Every segment is validated before
/// any bucket is touched, so an error never comes with a partial result.
pub fn aggregate_with(
    segments: &[AmountSegment],
    window: &ClosedDateInterval,
    config: &ProrationConfig,
) -> Result<BucketedResult> {
    if window.is_open_ended() {
        return Err(EngineError::InvalidInterval(
            "reporting window must have both bounds".to_string(),
        ));
    }
    for segment in segments {
        segment.validate()?;
    }

    let calendar = config.calendar();
    let mut result = BucketedResult::empty(window);

    for segment in segments {
        match segment {
            AmountSegment::MultiDay {
                from,
                to,
                total_amount,
            } => {
                let span = ClosedDateInterval::new(*from, *to)?;
                let working_days = calendar.working_days_in(&span);
                if working_days == 0 {
                    tracing::trace!(%from, %to, "multi-day segment has no working days");
                    continue;
                }
                let Some(inside) = span.intersection(window) else {
                    continue;
                };
                match total_amount {
                    Some(total) => {
                        credit_total(&mut result, &calendar, &span, &inside, working_days, *total)
                    }
                    None => {
                        for day in calendar.working_days(&inside) {
                            result.add(day, config.hours_per_day);
                        }
                    }
                }
            }
            AmountSegment::SingleDaySlot { day, total_amount } => {
                result.add(*day, total_amount.unwrap_or(config.half_day_hours));
            }
            AmountSegment::SubDayRange {
                start,
                end,
                total_amount,
            } => {
                let day = start.with_timezone(&config.timezone).date_naive();
                let amount = total_amount.unwrap_or_else(|| elapsed_hours(*start, *end));
                result.add(day, amount);
            }
        }
    }

    result.total = result.buckets.iter().map(|b| b.value).sum();

    tracing::debug!(
        from = %window.from(),
        to = %window.to(),
        segments = segments.len(),
        total = result.total,
        "aggregated amount segments"
    );

    Ok(result)
}

/// Prorate each subject's segments separately over the same window.
pub fn aggregate_by_subject(
    per_subject: &BTreeMap<String, Vec<AmountSegment>>,
    window: &ClosedDateInterval,
    config: &ProrationConfig,
) -> Result<BTreeMap<String, BucketedResult>> {
    per_subject
        .iter()
        .map(|(subject, segments)| Ok((subject.clone(), aggregate_with(segments, window, config)?)))
        .collect()
}

/// Spread `total` evenly over the `working_days` of `span`, crediting the days
/// inside `inside`. The last working day of the span takes whatever is left,
/// so the credits never add up to more than `total`.
fn credit_total(
    result: &mut BucketedResult,
    calendar: &WorkCalendar,
    span: &ClosedDateInterval,
    inside: &ClosedDateInterval,
    working_days: i64,
    total: f64,
) {
    let per_day = total / working_days as f64;
    let last = calendar.last_working_day(span);
    let before_window = working_days - calendar.working_days_in(inside);

    let mut handed_out = per_day * before_window as f64;
    for day in calendar.working_days(inside) {
        let credit = if Some(day) == last {
            (total - handed_out).max(0.0)
        } else {
            per_day
        };
        result.add(day, credit);
        handed_out += credit;
    }
}

fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
