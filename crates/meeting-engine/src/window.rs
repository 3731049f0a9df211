//! Time intervals and calendar-period boundaries in a fixed-offset zone.
//!
//! Boundaries are computed by converting the reference instant into the target
//! zone first and truncating there. `2024-04-03T23:30Z` therefore falls on
//! April 4th when the zone is `+09:00`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeInterval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval);
        }
        Ok(Self { start, end })
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    ///
    /// Touching endpoints (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// Calendar period granularity used by list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Day => "day",
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(PeriodKind::Day),
            "week" => Ok(PeriodKind::Week),
            "month" => Ok(PeriodKind::Month),
            other => Err(EngineError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Compute the `[start, end)` window of the period containing `reference`.
///
/// - `Day`: local midnight through the next local midnight.
/// - `Week`: Monday 00:00 through the following Monday 00:00.
/// - `Month`: the 1st at 00:00 through the 1st of the next month at 00:00.
///
/// # Errors
/// Returns `EngineError::OutOfRange` if a boundary falls outside chrono's
/// representable dates.
pub fn period_range<Tz: TimeZone>(
    kind: PeriodKind,
    reference: &DateTime<Tz>,
    zone: FixedOffset,
) -> Result<TimeInterval> {
    let day = reference.with_timezone(&zone).date_naive();

    let (first, next) = match kind {
        PeriodKind::Day => (day, day.succ_opt().ok_or(EngineError::OutOfRange)?),
        PeriodKind::Week => {
            let back = Days::new(u64::from(day.weekday().num_days_from_monday()));
            let monday = day.checked_sub_days(back).ok_or(EngineError::OutOfRange)?;
            let next = monday
                .checked_add_days(Days::new(7))
                .ok_or(EngineError::OutOfRange)?;
            (monday, next)
        }
        PeriodKind::Month => {
            let first = day.with_day(1).ok_or(EngineError::OutOfRange)?;
            let next = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            }
            .ok_or(EngineError::OutOfRange)?;
            (first, next)
        }
    };

    TimeInterval::new(local_midnight(first, zone)?, local_midnight(next, zone)?)
}

/// 00:00 of `date` in `zone`.
pub(crate) fn local_midnight(date: NaiveDate, zone: FixedOffset) -> Result<DateTime<FixedOffset>> {
    at_local_time(date, NaiveTime::MIN, zone)
}

pub(crate) fn at_local_time(
    date: NaiveDate,
    time: NaiveTime,
    zone: FixedOffset,
) -> Result<DateTime<FixedOffset>> {
    date.and_time(time)
        .and_local_timezone(zone)
        .single()
        .ok_or(EngineError::OutOfRange)
}
