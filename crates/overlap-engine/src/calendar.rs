//! Working-day calendar: Monday to Friday, minus configured holidays.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::interval::ClosedDateInterval;

/// Decides which days are working days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WorkCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_weekend(day: NaiveDate) -> bool {
        matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, day: NaiveDate) -> bool {
        self.holidays.contains(&day)
    }

    pub fn is_working_day(&self, day: NaiveDate) -> bool {
        !Self::is_weekend(day) && !self.is_holiday(day)
    }

    /// Count working days in `range` without walking it day by day, so
    /// open-ended ranges stay cheap.
    pub fn working_days_in(&self, range: &ClosedDateInterval) -> i64 {
        let weekday_holidays = self
            .holidays
            .range(range.from()..=range.to())
            .filter(|d| !Self::is_weekend(**d))
            .count() as i64;
        weekdays_between(range.from(), range.to()) - weekday_holidays
    }

    /// The latest working day in `range`. Walks back from the end, so it stays
    /// cheap for open-ended ranges.
    pub fn last_working_day(&self, range: &ClosedDateInterval) -> Option<NaiveDate> {
        let mut day = range.to();
        while day >= range.from() {
            if self.is_working_day(day) {
                return Some(day);
            }
            day = day.pred_opt()?;
        }
        None
    }

    /// Every working day in `range`, in order.
    pub fn working_days<'a>(
        &'a self,
        range: &ClosedDateInterval,
    ) -> impl Iterator<Item = NaiveDate> + 'a {
        range.days().filter(move |d| self.is_working_day(*d))
    }
}

/// Monday-to-Friday days in `[from, to]`.
fn weekdays_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if from > to {
        return 0;
    }
    let total = (to - from).num_days() + 1;
    let full_weeks = total / 7;
    let offset = i64::from(from.weekday().num_days_from_monday());
    let tail = (0..total % 7).filter(|i| (offset + i) % 7 < 5).count() as i64;
    full_weeks * 5 + tail
}
