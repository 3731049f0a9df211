//! Tests for conflict detection.

use chrono::{DateTime, FixedOffset, TimeZone};
use meeting_engine::{
    detect_conflicts, detect_conflicts_among, Conflict, ConflictKind, EngineError, Schedule,
};

fn at(day: u32, hour: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 3, day, hour, min, 0)
        .unwrap()
}

/// Helper to create a schedule from hour ranges on a given day.
fn schedule(
    id: &str,
    day: u32,
    start: (u32, u32),
    end: (u32, u32),
    participants: &[&str],
    room: Option<&str>,
) -> Schedule {
    let s = Schedule::new(id, at(day, start.0, start.1), at(day, end.0, end.1))
        .unwrap()
        .with_participants(participants.iter().copied());
    match room {
        Some(room) => s.with_room(room),
        None => s,
    }
}

#[test_log::test]
fn shared_participant_overlapping_thirty_minutes() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &["alice", "bob"], None)];
    let candidate = schedule("b", 1, (9, 30), (10, 30), &["bob", "carol"], None);

    let conflicts = detect_conflicts(&existing, &candidate);

    assert_eq!(conflicts, vec![Conflict::participant("a", "bob")]);
    assert_eq!(conflicts[0].kind, ConflictKind::Participant);
}

#[test]
fn shared_room_reported_once() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &[], Some("room-7"))];
    let candidate = schedule("b", 1, (9, 15), (9, 45), &[], Some("room-7"));

    let conflicts = detect_conflicts(&existing, &candidate);

    assert_eq!(conflicts, vec![Conflict::room("a", "room-7")]);
}

#[test]
fn different_rooms_do_not_conflict() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &[], Some("room-7"))];
    let candidate = schedule("b", 1, (9, 0), (10, 0), &[], Some("room-8"));

    assert!(detect_conflicts(&existing, &candidate).is_empty());
}

#[test]
fn missing_room_on_either_side_does_not_conflict() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &[], Some("room-7"))];
    let candidate = schedule("b", 1, (9, 0), (10, 0), &[], None);

    assert!(detect_conflicts(&existing, &candidate).is_empty());
}

#[test]
fn participants_precede_room_within_one_schedule() {
    let existing = vec![schedule(
        "a",
        1,
        (9, 0),
        (11, 0),
        &["dave", "bob"],
        Some("hall"),
    )];
    let candidate = schedule("b", 1, (10, 0), (12, 0), &["bob", "dave"], Some("hall"));

    let conflicts = detect_conflicts(&existing, &candidate);

    assert_eq!(
        conflicts,
        vec![
            Conflict::participant("a", "bob"),
            Conflict::participant("a", "dave"),
            Conflict::room("a", "hall"),
        ]
    );
}

#[test]
fn conflicts_follow_existing_order() {
    let existing = vec![
        schedule("z", 1, (9, 0), (10, 0), &["bob"], None),
        schedule("m", 1, (8, 0), (12, 0), &["bob"], None),
        schedule("a", 1, (13, 0), (14, 0), &["bob"], None),
    ];
    let candidate = schedule("new", 1, (9, 30), (11, 0), &["bob"], None);

    let ids: Vec<String> = detect_conflicts(&existing, &candidate)
        .into_iter()
        .map(|c| c.with_schedule_id)
        .collect();

    assert_eq!(ids, vec!["z", "m"]);
}

#[test]
fn adjacent_schedules_not_a_conflict() {
    // 09:00-10:00 and 10:00-11:00 share everything but only touch.
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &["bob"], Some("r"))];
    let candidate = schedule("b", 1, (10, 0), (11, 0), &["bob"], Some("r"));

    assert!(detect_conflicts(&existing, &candidate).is_empty());
    assert!(detect_conflicts(&[candidate], &existing[0]).is_empty());
}

#[test]
fn overlap_without_shared_resources_is_not_a_conflict() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &["alice"], None)];
    let candidate = schedule("b", 1, (9, 0), (10, 0), &["bob"], None);

    assert!(detect_conflicts(&existing, &candidate).is_empty());
}

#[test]
fn empty_participant_lists_emit_nothing() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &[], None)];
    let candidate = schedule("b", 1, (9, 0), (10, 0), &["bob"], None);

    assert!(detect_conflicts(&existing, &candidate).is_empty());
}

#[test]
fn empty_existing_list_no_conflicts() {
    let candidate = schedule("b", 1, (9, 0), (10, 0), &["bob"], None);
    let conflicts = detect_conflicts(&[], &candidate);
    assert!(conflicts.is_empty());
    assert_eq!(conflicts.capacity(), 0, "no allocation for an empty result");
}

#[test]
fn stored_copy_of_candidate_is_ignored() {
    let existing = vec![schedule("a", 1, (9, 0), (10, 0), &["bob"], Some("r"))];
    let updated = schedule("a", 1, (9, 30), (10, 30), &["bob"], Some("r"));

    assert!(detect_conflicts(&existing, &updated).is_empty());
}

#[test]
fn schedule_rejects_inverted_interval() {
    let err = Schedule::new("x", at(1, 10, 0), at(1, 9, 0)).unwrap_err();
    assert_eq!(err, EngineError::InvalidInterval);
}

// ---------------------------------------------------------------------------
// All-pairs variant
// ---------------------------------------------------------------------------

#[test]
fn all_pairs_reports_each_pair_once() {
    let schedules = vec![
        schedule("a", 1, (9, 0), (10, 0), &["bob"], None),
        schedule("b", 1, (9, 30), (10, 30), &["bob"], Some("r1")),
        schedule("c", 1, (10, 0), (11, 0), &["carol"], Some("r1")),
    ];

    let warnings = detect_conflicts_among(&schedules);

    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].schedule_id, "a");
    assert_eq!(warnings[0].conflict, Conflict::participant("b", "bob"));
    assert_eq!(warnings[1].schedule_id, "b");
    assert_eq!(warnings[1].conflict, Conflict::room("c", "r1"));
}

#[test]
fn all_pairs_skips_self_pairs() {
    let one = schedule("a", 1, (9, 0), (10, 0), &["bob"], Some("r"));
    let warnings = detect_conflicts_among(&[one.clone(), one]);
    assert!(warnings.is_empty());
}

#[test]
fn all_pairs_on_empty_list() {
    assert!(detect_conflicts_among(&[]).is_empty());
}

#[test]
fn conflict_serializes_with_type_tag() {
    let json = serde_json::to_value(Conflict::participant("a", "bob")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"with_schedule_id": "a", "type": "participant", "participant_id": "bob"})
    );
}
