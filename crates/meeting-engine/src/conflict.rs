//! Detect double bookings between schedules.
//!
//! Two schedules conflict when their time ranges overlap AND they share at
//! least one participant or the same room. Ranges are half-open, so a meeting
//! that ends exactly when another starts is NOT a conflict.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::window::TimeInterval;

/// The conflict-relevant view of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub participant_ids: BTreeSet<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Schedule {
    /// A schedule with no participants and no room.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidInterval` if `start >= end`.
    pub fn new(
        id: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let interval = TimeInterval::new(start, end)?;
        Ok(Self {
            id: id.into(),
            participant_ids: BTreeSet::new(),
            room_id: None,
            start: interval.start,
            end: interval.end,
        })
    }

    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids
            .extend(participants.into_iter().map(Into::into));
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end,
        }
    }

    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.interval().overlaps(&other.interval())
    }
}

/// What the two schedules have in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Participant,
    Room,
}

/// A detected double booking against another schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    pub with_schedule_id: String,
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl Conflict {
    pub fn participant(with_schedule_id: impl Into<String>, participant_id: impl Into<String>) -> Self {
        Self {
            with_schedule_id: with_schedule_id.into(),
            kind: ConflictKind::Participant,
            participant_id: Some(participant_id.into()),
            room_id: None,
        }
    }

    pub fn room(with_schedule_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            with_schedule_id: with_schedule_id.into(),
            kind: ConflictKind::Room,
            participant_id: None,
            room_id: Some(room_id.into()),
        }
    }
}

/// A conflict found inside a list, attributed to one of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWarning {
    pub schedule_id: String,
    pub conflict: Conflict,
}

/// Find every conflict between `candidate` and the `existing` schedules.
///
/// Conflicts follow the order of `existing`. For each overlapping schedule,
/// one participant conflict is emitted per shared participant (in participant
/// id order), followed by at most one room conflict. An entry with the same id
/// as the candidate is skipped, so update flows may pass the stored copy.
pub fn detect_conflicts(existing: &[Schedule], candidate: &Schedule) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for other in existing {
        if other.id == candidate.id {
            continue;
        }
        collect_pair(other, candidate, &mut conflicts);
    }

    if !conflicts.is_empty() {
        tracing::debug!(
            candidate = %candidate.id,
            count = conflicts.len(),
            "schedule conflicts detected"
        );
    }
    conflicts
}

/// Check every unordered pair in `schedules` (`i < j`) once.
///
/// Each conflict is attributed to `schedules[i]` and names `schedules[j]` in
/// `with_schedule_id`. Runs in O(n²); meant for one page of list results.
pub fn detect_conflicts_among(schedules: &[Schedule]) -> Vec<ScheduleWarning> {
    let mut warnings = Vec::new();
    let mut scratch = Vec::new();

    for (i, first) in schedules.iter().enumerate() {
        for second in &schedules[i + 1..] {
            if first.id == second.id {
                continue;
            }
            collect_pair(second, first, &mut scratch);
            warnings.extend(scratch.drain(..).map(|conflict| ScheduleWarning {
                schedule_id: first.id.clone(),
                conflict,
            }));
        }
    }

    warnings
}

/// Push the conflicts `candidate` has with `other`, tagged with `other.id`.
fn collect_pair(other: &Schedule, candidate: &Schedule, out: &mut Vec<Conflict>) {
    if !other.overlaps(candidate) {
        return;
    }

    for participant in other.participant_ids.intersection(&candidate.participant_ids) {
        out.push(Conflict::participant(other.id.as_str(), participant.as_str()));
    }

    if let (Some(a), Some(b)) = (&other.room_id, &candidate.room_id) {
        if a == b {
            out.push(Conflict::room(other.id.as_str(), a.as_str()));
        }
    }
}
