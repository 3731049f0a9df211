//! RRULE import/export tests.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Weekday};
use meeting_engine::{
    generate_occurrences, EngineError, ExpansionOptions, Frequency, RecurrenceRule, WeekdaySet,
};

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(year, month, day, hour, min, 0)
        .unwrap()
}

#[test]
fn imports_weekly_byday_until() {
    let rule = RecurrenceRule::from_rrule(
        "r1",
        "s1",
        "FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240318T000000Z",
        at(2024, 3, 4, 9, 0),
    )
    .expect("should import");

    assert_eq!(rule.frequency, Frequency::Weekly);
    assert_eq!(
        rule.weekdays,
        [Weekday::Mon, Weekday::Wed, Weekday::Fri].into_iter().collect::<WeekdaySet>()
    );
    assert_eq!(rule.ends_on, Some(at(2024, 3, 18, 9, 0)));
    assert_eq!(rule.ends_on.unwrap().offset().local_minus_utc(), 9 * 3600);
}

#[test]
fn accepts_rrule_prefix_and_daily_without_byday() {
    let rule = RecurrenceRule::from_rrule(
        "r1",
        "s1",
        "RRULE:FREQ=DAILY;UNTIL=20240310T000000Z",
        at(2024, 3, 4, 9, 0),
    )
    .unwrap();

    assert_eq!(rule.frequency, Frequency::Daily);
    assert!(rule.weekdays.is_empty());
}

#[test]
fn imported_rule_expands_like_hand_built_rule() {
    let starts = at(2024, 3, 4, 9, 0);
    let imported = RecurrenceRule::from_rrule(
        "r1",
        "s1",
        "FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240318T000000Z",
        starts,
    )
    .unwrap();

    let occurrences = generate_occurrences(
        &imported,
        starts,
        at(2024, 3, 4, 10, 0),
        &ExpansionOptions::default(),
        imported.starts_on.timezone(),
    )
    .unwrap();

    assert_eq!(occurrences.len(), 7);
}

#[test]
fn weekly_without_byday_repeats_on_start_weekday() {
    let starts = at(2024, 3, 4, 9, 0);
    let rule =
        RecurrenceRule::from_rrule("r1", "s1", "FREQ=WEEKLY;UNTIL=20240318T000000Z", starts)
            .unwrap();

    assert_eq!(rule.weekdays, [Weekday::Mon].into_iter().collect::<WeekdaySet>());

    let occurrences = generate_occurrences(
        &rule,
        starts,
        at(2024, 3, 4, 10, 0),
        &ExpansionOptions::default(),
        starts.timezone(),
    )
    .unwrap();
    let days: Vec<u32> = occurrences.iter().map(|o| o.start.day()).collect();
    assert_eq!(days, vec![4, 11, 18]);
}

#[test]
fn weekly_without_byday_uses_local_weekday_of_start() {
    // 2024-03-03T23:30Z is already Monday in +09:00.
    let starts = at(2024, 3, 4, 8, 30);
    let rule = RecurrenceRule::from_rrule("r1", "s1", "FREQ=WEEKLY", starts).unwrap();

    assert!(rule.weekdays.contains(Weekday::Mon));
    assert_eq!(rule.weekdays.len(), 1);
}

#[test]
fn monthly_frequency_is_invalid() {
    let err = RecurrenceRule::from_rrule(
        "r1",
        "s1",
        "FREQ=MONTHLY;BYDAY=TU;BYSETPOS=3",
        at(2024, 3, 4, 9, 0),
    )
    .unwrap_err();

    assert_eq!(err, EngineError::InvalidFrequency("MONTHLY".to_string()));
}

#[test]
fn count_and_interval_are_unsupported() {
    for raw in ["FREQ=DAILY;COUNT=5", "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU"] {
        let err = RecurrenceRule::from_rrule("r1", "s1", raw, at(2024, 3, 4, 9, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRule(_)), "{raw}: {err:?}");
    }
}

#[test]
fn garbage_and_empty_input_rejected() {
    for raw in ["", "   ", "NOT A RULE"] {
        let err = RecurrenceRule::from_rrule("r1", "s1", raw, at(2024, 3, 4, 9, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRule(_)), "{raw:?}: {err:?}");
    }
}

#[test]
fn exports_weekly_rule() {
    let rule = RecurrenceRule::new(
        "r1",
        "s1",
        Frequency::Weekly,
        [Weekday::Fri, Weekday::Mon].into_iter().collect(),
        at(2024, 3, 4, 9, 0),
        Some(at(2024, 3, 18, 9, 0)),
    )
    .unwrap();

    assert_eq!(
        rule.to_rrule().unwrap(),
        "FREQ=WEEKLY;BYDAY=MO,FR;UNTIL=20240318T000000Z"
    );
}

#[test]
fn weekly_rule_without_weekdays_cannot_be_exported() {
    let rule = RecurrenceRule::new(
        "r1",
        "s1",
        Frequency::Weekly,
        WeekdaySet::EMPTY,
        at(2024, 3, 4, 9, 0),
        Some(at(2024, 3, 18, 9, 0)),
    )
    .unwrap();

    assert!(matches!(rule.to_rrule(), Err(EngineError::InvalidRule(_))));
}

#[test]
fn export_then_import_preserves_rule() {
    let original = RecurrenceRule::new(
        "r1",
        "s1",
        Frequency::Daily,
        WeekdaySet::WEEKDAYS,
        at(2024, 3, 4, 9, 0),
        Some(at(2024, 6, 30, 18, 0)),
    )
    .unwrap();

    let imported =
        RecurrenceRule::from_rrule("r1", "s1", &original.to_rrule().unwrap(), original.starts_on).unwrap();

    assert_eq!(imported, original);
}
