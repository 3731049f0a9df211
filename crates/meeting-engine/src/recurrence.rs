//! Recurrence expansion -- turns a daily/weekly rule into concrete occurrences.
//!
//! Expansion always runs in a single fixed-offset zone supplied by the caller.
//! Inputs may carry any offset; they are converted into that zone before the
//! walk, and every emitted occurrence is reported in it. Open-ended expansion
//! is refused: either the rule or the caller must supply an upper bound.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::window::at_local_time;

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Every day, optionally filtered by the rule's weekday set.
    Daily,
    /// Only on the weekdays in the rule's set.
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    /// Whether a day with the given weekday produces an occurrence.
    ///
    /// A daily rule with an empty set fires every day; a non-empty set filters
    /// it exactly like a weekly rule. A weekly rule with an empty set never fires.
    pub fn includes(&self, weekdays: WeekdaySet, day: Weekday) -> bool {
        match self {
            Frequency::Daily => weekdays.is_empty() || weekdays.contains(day),
            Frequency::Weekly => weekdays.contains(day),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(EngineError::InvalidFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays stored as a 7-bit mask (bit 0 = Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);
    /// Monday through Friday.
    pub const WEEKDAYS: WeekdaySet = WeekdaySet(0b001_1111);

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    /// Adds `day`; returns `true` if it was not already present.
    pub fn insert(&mut self, day: Weekday) -> bool {
        let absent = !self.contains(day);
        self.0 |= Self::bit(day);
        absent
    }

    /// Removes `day`; returns `true` if it was present.
    pub fn remove(&mut self, day: Weekday) -> bool {
        let present = self.contains(day);
        self.0 &= !Self::bit(day);
        present
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekdays in the set, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// A repetition rule attached to a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: String,
    pub owner_schedule_id: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub weekdays: WeekdaySet,
    pub starts_on: DateTime<FixedOffset>,
    #[serde(default)]
    pub ends_on: Option<DateTime<FixedOffset>>,
}

impl RecurrenceRule {
    /// Build a rule, checking that `ends_on` (when present) is not before `starts_on`.
    pub fn new(
        id: impl Into<String>,
        owner_schedule_id: impl Into<String>,
        frequency: Frequency,
        weekdays: WeekdaySet,
        starts_on: DateTime<FixedOffset>,
        ends_on: Option<DateTime<FixedOffset>>,
    ) -> Result<Self> {
        if let Some(end) = ends_on {
            if end < starts_on {
                return Err(EngineError::InvalidInterval);
            }
        }
        Ok(Self {
            id: id.into(),
            owner_schedule_id: owner_schedule_id.into(),
            frequency,
            weekdays,
            starts_on,
            ends_on,
        })
    }
}

/// One concrete instance of a recurring schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub owner_schedule_id: String,
    pub rule_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Optional caller-side window that narrows the rule's own bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionOptions {
    #[serde(default)]
    pub range_start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub range_end: Option<DateTime<FixedOffset>>,
}

impl ExpansionOptions {
    pub fn between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            range_start: Some(start),
            range_end: Some(end),
        }
    }
}

/// Expand `rule` into the occurrences whose start lies in
/// `[max(starts_on, range_start), min(ends_on, range_end)]`.
///
/// Each occurrence keeps the time of day of `base_start` (as seen in `zone`)
/// and lasts `base_end - base_start`. At most one occurrence is produced per
/// calendar day, in strictly ascending order.
///
/// # Arguments
/// - `rule` -- the repetition rule; its ids tag every occurrence
/// - `base_start`, `base_end` -- the owning schedule's first instance
/// - `options` -- optional range narrowing the rule's bounds
/// - `zone` -- the fixed-offset zone used for calendar math and output
///
/// # Errors
/// Returns `EngineError::InvalidDuration` if `base_end <= base_start`.
/// Returns `EngineError::UnboundedWindow` if neither `rule.ends_on` nor
/// `options.range_end` is set.
#[tracing::instrument(skip_all, fields(rule_id = %rule.id, owner = %rule.owner_schedule_id))]
pub fn generate_occurrences(
    rule: &RecurrenceRule,
    base_start: DateTime<FixedOffset>,
    base_end: DateTime<FixedOffset>,
    options: &ExpansionOptions,
    zone: FixedOffset,
) -> Result<Vec<Occurrence>> {
    let base_start = base_start.with_timezone(&zone);
    let base_end = base_end.with_timezone(&zone);

    let duration = base_end - base_start;
    if duration <= Duration::zero() {
        return Err(EngineError::InvalidDuration);
    }

    let upper = match (rule.ends_on, options.range_end) {
        (Some(ends_on), Some(range_end)) => ends_on.min(range_end),
        (Some(bound), None) | (None, Some(bound)) => bound,
        (None, None) => return Err(EngineError::UnboundedWindow),
    }
    .with_timezone(&zone);

    let lower = match options.range_start {
        Some(range_start) => rule.starts_on.max(range_start),
        None => rule.starts_on,
    }
    .with_timezone(&zone);

    if lower > upper || (rule.frequency == Frequency::Weekly && rule.weekdays.is_empty()) {
        tracing::debug!(%lower, %upper, "empty expansion window");
        return Ok(Vec::new());
    }

    let time_of_day = base_start.time();
    let last_day = upper.date_naive();
    let mut day = lower.date_naive();
    let mut occurrences = Vec::new();

    while day <= last_day {
        if rule.frequency.includes(rule.weekdays, day.weekday()) {
            let start = at_local_time(day, time_of_day, zone)?;
            // The first and last day may hold a candidate outside the bounds.
            if start >= lower && start <= upper {
                let end = start
                    .checked_add_signed(duration)
                    .ok_or(EngineError::OutOfRange)?;
                occurrences.push(Occurrence {
                    owner_schedule_id: rule.owner_schedule_id.clone(),
                    rule_id: rule.id.clone(),
                    start,
                    end,
                });
            }
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    tracing::debug!(count = occurrences.len(), "expanded recurrence rule");
    Ok(occurrences)
}
