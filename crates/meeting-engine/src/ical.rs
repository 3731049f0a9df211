//! RFC 5545 RRULE import/export for [`RecurrenceRule`].
//!
//! Only the subset the engine can express round-trips: `FREQ=DAILY|WEEKLY`,
//! plain `BYDAY` entries, `UNTIL` and `INTERVAL=1`. Parsing is delegated to the
//! `rrule` crate.

use chrono::{DateTime, Datelike, FixedOffset, Utc, Weekday};
use rrule::{NWeekday, RRule, Unvalidated};

use crate::error::{EngineError, Result};
use crate::recurrence::{Frequency, RecurrenceRule, WeekdaySet};

impl RecurrenceRule {
    /// Import an RRULE string (with or without the `RRULE:` prefix).
    ///
    /// `UNTIL` becomes `ends_on`, converted to the offset of `starts_on`.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidFrequency` for any FREQ other than DAILY/WEEKLY,
    /// and `EngineError::InvalidRule` for syntax errors or unsupported parts
    /// (`COUNT`, `INTERVAL` > 1, ordinal `BYDAY`, month/set-position filters).
    pub fn from_rrule(
        id: impl Into<String>,
        owner_schedule_id: impl Into<String>,
        rrule: &str,
        starts_on: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let body = rrule.trim();
        let body = body
            .strip_prefix("RRULE:")
            .or_else(|| body.strip_prefix("rrule:"))
            .unwrap_or(body);
        if body.is_empty() {
            return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
        }

        let parsed = body
            .parse::<RRule<Unvalidated>>()
            .map_err(|e| EngineError::InvalidRule(e.to_string()))?;

        let frequency = match parsed.get_freq() {
            rrule::Frequency::Daily => Frequency::Daily,
            rrule::Frequency::Weekly => Frequency::Weekly,
            other => {
                return Err(EngineError::InvalidFrequency(
                    format!("{:?}", other).to_uppercase(),
                ))
            }
        };

        if parsed.get_interval() != 1 {
            return Err(EngineError::InvalidRule(format!(
                "INTERVAL={} is not supported",
                parsed.get_interval()
            )));
        }
        if parsed.get_count().is_some() {
            return Err(EngineError::InvalidRule(
                "COUNT is not supported; use UNTIL".to_string(),
            ));
        }
        if !parsed.get_by_month().is_empty()
            || !parsed.get_by_month_day().is_empty()
            || !parsed.get_by_set_pos().is_empty()
        {
            return Err(EngineError::InvalidRule(
                "only BYDAY filters are supported".to_string(),
            ));
        }

        let mut weekdays = WeekdaySet::EMPTY;
        for nth in parsed.get_by_weekday().iter().copied() {
            match nth {
                NWeekday::Every(day) => {
                    weekdays.insert(day);
                }
                NWeekday::Nth(n, day) => {
                    return Err(EngineError::InvalidRule(format!(
                        "ordinal BYDAY {}{} is not supported",
                        n,
                        weekday_code(day)
                    )))
                }
            }
        }

        // A weekly RRULE without BYDAY repeats on the weekday of DTSTART.
        if frequency == Frequency::Weekly && weekdays.is_empty() {
            weekdays.insert(starts_on.weekday());
        }

        let ends_on = parsed
            .get_until()
            .map(|until| until.with_timezone(starts_on.offset()));

        RecurrenceRule::new(
            id,
            owner_schedule_id,
            frequency,
            weekdays,
            starts_on,
            ends_on,
        )
    }

    /// Render the rule as an RRULE value (without the `RRULE:` prefix).
    ///
    /// `UNTIL` is always written in UTC form.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRule` for a weekly rule with no weekdays:
    /// it never fires here, but a bare `FREQ=WEEKLY` would fire every week.
    pub fn to_rrule(&self) -> Result<String> {
        if self.frequency == Frequency::Weekly && self.weekdays.is_empty() {
            return Err(EngineError::InvalidRule(
                "weekly rule without weekdays has no RRULE form".to_string(),
            ));
        }
        let mut out = format!("FREQ={}", self.frequency.as_str().to_uppercase());
        if !self.weekdays.is_empty() {
            let days: Vec<&str> = self.weekdays.iter().map(weekday_code).collect();
            out.push_str(";BYDAY=");
            out.push_str(&days.join(","));
        }
        if let Some(ends_on) = self.ends_on {
            out.push_str(";UNTIL=");
            out.push_str(
                &ends_on
                    .with_timezone(&Utc)
                    .format("%Y%m%dT%H%M%SZ")
                    .to_string(),
            );
        }
        Ok(out)
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
