//! # meeting-engine
//!
//! The temporal-reasoning core of a meeting-scheduling backend.
//!
//! Everything here is pure, in-memory and I/O-free: orchestration hands in
//! normalized rules and schedules, and gets back occurrences and conflict
//! warnings. Calendar math happens in one fixed-offset zone that the caller
//! passes explicitly (see [`config::default_utc_offset`] for the default).
//!
//! ## Modules
//!
//! - [`recurrence`]: daily/weekly rule → bounded, ordered occurrences
//! - [`conflict`]: overlap + shared participant/room detection
//! - [`cache`]: bounded TTL cache for conflict warnings
//! - [`window`]: time intervals and day/week/month period ranges
//! - [`ical`]: RRULE import/export for recurrence rules
//! - [`config`]: engine settings and UTC offset parsing
//! - [`error`]: Error types

pub mod cache;
pub mod config;
pub mod conflict;
pub mod error;
pub mod ical;
pub mod recurrence;
pub mod window;

pub use cache::{CacheKey, WarningCache, WarningQuery};
pub use config::{CacheConfig, EngineConfig};
pub use conflict::{
    detect_conflicts, detect_conflicts_among, Conflict, ConflictKind, Schedule, ScheduleWarning,
};
pub use error::EngineError;
pub use recurrence::{
    generate_occurrences, ExpansionOptions, Frequency, Occurrence, RecurrenceRule, WeekdaySet,
};
pub use window::{period_range, PeriodKind, TimeInterval};
