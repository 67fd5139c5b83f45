//! Monthly calendar keys and aggregation windows
//!
//! Independently sampled series are aligned on a `"YYYY-MM"` calendar key.
//! Windows are half-open: a sample stamped exactly at `end` belongs to the
//! next window.

use crate::error::{Error, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A (year, month) pair, formatted as `"YYYY-MM"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarKey {
    year: i32,
    month: u32,
}

impl CalendarKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidParameter {
                name: "month",
                value: month.to_string(),
                reason: "must be in 1..=12".into(),
            });
        }
        Ok(Self { year, month })
    }

    /// Key of the month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Zero-padded month, e.g. `"03"`
    pub fn month_label(&self) -> String {
        format!("{:02}", self.month)
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        // year/month are validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Half-open window covering this month
    pub fn window(&self) -> MonthWindow {
        let start = self.first_day();
        let end = start
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        MonthWindow {
            key: *self,
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        }
    }
}

impl fmt::Display for CalendarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidParameter {
            name: "yearMonth",
            value: s.to_string(),
            reason: "expected YYYY-MM".into(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        CalendarKey::new(year, month)
    }
}

/// Half-open `[start, end)` window of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub key: CalendarKey,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MonthWindow {
    /// Exact day difference between the window bounds.
    ///
    /// Fractional by construction; with naive (UTC) timestamps it is always
    /// a whole number between 28 and 31.
    pub fn n_days(&self) -> f64 {
        day_difference(self.start, self.end)
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.end
    }

    /// One window per day of the month, in order
    pub fn days(&self) -> Vec<DayWindow> {
        let mut days = Vec::with_capacity(31);
        let mut start = self.start;
        while start < self.end {
            let end = start + TimeDelta::days(1);
            days.push(DayWindow { start, end });
            start = end;
        }
        days
    }
}

/// Half-open `[start, end)` window of one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DayWindow {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.end
    }
}

/// Exact difference `end - start` in (fractional) days
pub fn day_difference(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Every month window whose start falls in `[start, end)`.
///
/// `start` and `end` must be month-aligned (first of month) and ordered.
pub fn month_windows(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthWindow>> {
    check_month_aligned("start_date", start)?;
    check_month_aligned("end_date", end)?;
    if end <= start {
        return Err(Error::InvalidParameter {
            name: "end_date",
            value: end.to_string(),
            reason: format!("must be after start_date {}", start),
        });
    }

    let mut windows = Vec::new();
    let mut key = CalendarKey::of(start);
    loop {
        let window = key.window();
        if window.start.date() >= end {
            break;
        }
        windows.push(window);
        key = CalendarKey::of(window.end.date());
    }
    Ok(windows)
}

fn check_month_aligned(name: &'static str, date: NaiveDate) -> Result<()> {
    if date.day() != 1 {
        return Err(Error::InvalidParameter {
            name,
            value: date.to_string(),
            reason: "must be the first day of a month".into(),
        });
    }
    Ok(())
}
