//! Tests for configuration parsing, validation, and month arithmetic.

use chrono::NaiveTime;
use slot_engine::config::SlotConfig;
use slot_engine::dst::DstPolicy;
use slot_engine::source::{AvailabilitySource, SourceError, StaticSource};
use slot_engine::window::Month;
use slot_engine::{Interval, SlotError};

#[test]
fn defaults_match_the_standard_work_day() {
    let config = SlotConfig::default();
    assert_eq!(config.time_zone, chrono_tz::America::Santo_Domingo);
    assert_eq!(config.work_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(config.work_end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    assert_eq!(config.slot_minutes, 60);
    assert_eq!(config.calendar_ids, vec!["primary".to_string()]);
    assert!(!config.skip_weekends);
    assert!(config.include_events);
    assert_eq!(config.dst_policy, DstPolicy::ShiftForward);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_document_yields_defaults() {
    let config = SlotConfig::from_json_str("{}").unwrap();
    assert_eq!(config, SlotConfig::default());
}

#[test]
fn parses_full_document() {
    let json = r#"{
        "timeZone": "America/New_York",
        "workStart": "08:30",
        "workEnd": "17:00",
        "slotMinutes": 30,
        "calendarIds": ["primary", "team@example.com"],
        "skipWeekends": true,
        "dstPolicy": "skip",
        "includeEvents": false
    }"#;
    let config = SlotConfig::from_json_str(json).unwrap();

    assert_eq!(config.time_zone, chrono_tz::America::New_York);
    assert_eq!(config.work_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    assert_eq!(config.work_end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    assert_eq!(config.slot_minutes, 30);
    assert_eq!(config.calendar_ids.len(), 2);
    assert!(config.skip_weekends);
    assert_eq!(config.dst_policy, DstPolicy::Skip);
    assert!(!config.include_events);
}

#[test]
fn serializes_back_to_the_same_document_shape() {
    let config = SlotConfig::from_json_str(r#"{"workStart":"08:30","slotMinutes":45}"#).unwrap();
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["timeZone"], "America/Santo_Domingo");
    assert_eq!(json["workStart"], "08:30");
    assert_eq!(json["workEnd"], "18:00");
    assert_eq!(json["slotMinutes"], 45);
    assert_eq!(json["dstPolicy"], "shiftForward");

    let again: SlotConfig = serde_json::from_value(json).unwrap();
    assert_eq!(again, config);
}

#[test]
fn unknown_timezone_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"timeZone":"Mars/Olympus_Mons"}"#).unwrap_err();
    assert!(matches!(err, SlotError::InvalidTimezone(ref tz) if tz == "Mars/Olympus_Mons"));
}

#[test]
fn malformed_time_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"workStart":"9am"}"#).unwrap_err();
    assert!(matches!(err, SlotError::InvalidTime(_)));
}

#[test]
fn inverted_window_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"workStart":"18:00","workEnd":"09:00"}"#).unwrap_err();
    assert!(matches!(err, SlotError::InvalidConfig(_)));
}

#[test]
fn zero_slot_length_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"slotMinutes":0}"#).unwrap_err();
    assert!(matches!(err, SlotError::InvalidConfig(_)));
}

#[test]
fn slot_longer_than_window_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"workStart":"09:00","workEnd":"10:00","slotMinutes":90}"#)
        .unwrap_err();
    assert!(matches!(err, SlotError::InvalidConfig(_)));
}

#[test]
fn empty_calendar_list_is_rejected() {
    let err = SlotConfig::from_json_str(r#"{"calendarIds":[]}"#).unwrap_err();
    assert!(matches!(err, SlotError::InvalidConfig(_)));
}

#[test]
fn missing_config_file_is_io_error() {
    let err = SlotConfig::from_json_file("/nonexistent/slots.json").unwrap_err();
    assert!(matches!(err, SlotError::Io(_)));
}

// ── Month ───────────────────────────────────────────────────────────────────

#[test]
fn month_parses_and_displays() {
    let month: Month = "2025-11".parse().unwrap();
    assert_eq!(month.year(), 2025);
    assert_eq!(month.month(), 11);
    assert_eq!(month.to_string(), "2025-11");
}

#[test]
fn month_rejects_malformed_input() {
    for bad in ["2025-13", "2025-00", "2025-1", "25-11", "2025/11", "november", ""] {
        assert!(
            matches!(Month::parse(bad), Err(SlotError::InvalidMonth(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn month_lengths() {
    assert_eq!(Month::new(2025, 11).unwrap().len_days(), 30);
    assert_eq!(Month::new(2025, 12).unwrap().len_days(), 31);
    assert_eq!(Month::new(2025, 2).unwrap().len_days(), 28);
    assert_eq!(Month::new(2028, 2).unwrap().len_days(), 29);
}

#[test]
fn december_rolls_into_next_year() {
    let next = Month::new(2025, 12).unwrap().next();
    assert_eq!(next, Month::new(2026, 1).unwrap());
}

// ── Static source ───────────────────────────────────────────────────────────

#[test]
fn static_source_parses_busy_json() {
    let json = r#"{
        "primary": [
            { "start": "2025-11-03T10:30:00-04:00", "end": "2025-11-03T11:30:00-04:00" }
        ]
    }"#;
    let source = StaticSource::from_json_str(json).unwrap();
    let range = Interval::new(
        "2025-11-01T04:00:00Z".parse().unwrap(),
        "2025-12-01T04:00:00Z".parse().unwrap(),
    )
    .unwrap();

    let busy = source
        .fetch_busy(&range, &["primary".to_string(), "room".to_string()])
        .unwrap();
    assert_eq!(busy["primary"].len(), 1);
    assert!(busy["room"].is_empty());
}

#[test]
fn static_source_filters_to_requested_range() {
    let json = r#"{
        "primary": [
            { "start": "2025-10-31T10:00:00Z", "end": "2025-10-31T11:00:00Z" },
            { "start": "2025-11-03T10:00:00Z", "end": "2025-11-03T11:00:00Z" }
        ]
    }"#;
    let source = StaticSource::from_json_str(json).unwrap();
    let range = Interval::new(
        "2025-11-01T04:00:00Z".parse().unwrap(),
        "2025-12-01T04:00:00Z".parse().unwrap(),
    )
    .unwrap();
    let busy = source.fetch_busy(&range, &["primary".to_string()]).unwrap();
    assert_eq!(busy["primary"].len(), 1);
}

#[test]
fn static_source_rejects_inverted_interval() {
    let json = r#"{ "primary": [ { "start": "2025-11-03T11:00:00Z", "end": "2025-11-03T10:00:00Z" } ] }"#;
    assert!(StaticSource::from_json_str(json).is_err());
}

#[test]
fn missing_busy_file_is_io_error() {
    let err = StaticSource::from_json_file("/nonexistent/busy.json").unwrap_err();
    match err {
        SourceError::Io { path, source } => {
            assert_eq!(path, std::path::PathBuf::from("/nonexistent/busy.json"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {other:?}"),
    }
}
