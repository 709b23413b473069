//! Timeline math - mapping calendar dates onto terminal columns

use crate::config::ScaleUnit;
use chrono::{Datelike, Duration, Months, NaiveDate};

/// Upper bound on generated scale ticks
const MAX_TICKS: usize = 4096;

/// Inclusive date range spread across `width` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub width: u16,
}

impl Timeline {
    /// Build a timeline over the given dates; `None` if there are none
    pub fn spanning(dates: impl IntoIterator<Item = NaiveDate>, width: u16) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end, width })
    }

    /// Number of days covered, inclusive
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Column for `date`, or `None` outside the range
    pub fn column(&self, date: NaiveDate) -> Option<u16> {
        if date < self.start || date > self.end || self.width == 0 {
            return None;
        }
        let offset = (date - self.start).num_days();
        let col = offset * i64::from(self.width) / self.days();
        u16::try_from(col).ok()
    }

    /// Last column occupied by `date` (a day may span several columns)
    pub fn column_end(&self, date: NaiveDate) -> Option<u16> {
        let first = self.column(date)?;
        let next = date
            .succ_opt()
            .and_then(|d| self.column(d))
            .unwrap_or(self.width);
        Some(next.saturating_sub(1).max(first))
    }

    /// Like [`Timeline::column`] but clamps dates before the start to 0
    pub fn clamped_column(&self, date: NaiveDate) -> Option<u16> {
        if date < self.start {
            Some(0)
        } else {
            self.column(date)
        }
    }
}

/// Start of the `unit` period containing `date`
pub fn period_start(unit: ScaleUnit, date: NaiveDate) -> NaiveDate {
    match unit {
        ScaleUnit::Day => date,
        ScaleUnit::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        ScaleUnit::Month => date.with_day(1).unwrap_or(date),
        ScaleUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

fn advance(unit: ScaleUnit, step: u32, date: NaiveDate) -> Option<NaiveDate> {
    match unit {
        ScaleUnit::Day => date.checked_add_signed(Duration::days(i64::from(step))),
        ScaleUnit::Week => date.checked_add_signed(Duration::weeks(i64::from(step))),
        ScaleUnit::Month => date.checked_add_months(Months::new(step)),
        ScaleUnit::Year => date.checked_add_months(Months::new(step.saturating_mul(12))),
    }
}

/// Period boundaries touching `[start, end]`, first one at or before `start`
pub fn ticks(unit: ScaleUnit, step: u32, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let step = step.max(1);
    let mut out = Vec::new();
    let mut current = Some(period_start(unit, start));

    while let Some(date) = current {
        if date > end || out.len() >= MAX_TICKS {
            break;
        }
        out.push(date);
        current = advance(unit, step, date);
    }

    out
}
