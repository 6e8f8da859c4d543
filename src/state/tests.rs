//! Tests for cursor values, converters and interval state

use super::*;
use crate::cursor::CursorField;
use crate::error::Error;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn dt(s: &str) -> DateTime<Utc> {
    parse_datetime(s).unwrap()
}

fn interval(start: i64, end: i64) -> Interval<DateTime<Utc>> {
    Interval::new(ts(start), ts(end))
}

// ============================================================================
// Datetime Parsing Tests
// ============================================================================

#[test_case("2024-01-15T10:30:00Z", "2024-01-15T10:30:00Z" ; "rfc3339")]
#[test_case("2024-01-15T12:30:00+02:00", "2024-01-15T10:30:00Z" ; "rfc3339 with offset")]
#[test_case("2024-01-15T10:30:00.250", "2024-01-15T10:30:00.250Z" ; "naive with fraction")]
#[test_case("2024-01-15 10:30:00", "2024-01-15T10:30:00Z" ; "space separated")]
#[test_case("2024-01-15", "2024-01-15T00:00:00Z" ; "date only")]
#[test_case("2024/01/15", "2024-01-15T00:00:00Z" ; "slashed date")]
fn test_parse_datetime(input: &str, expected: &str) {
    let expected = DateTime::parse_from_rfc3339(expected)
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(parse_datetime(input).unwrap(), expected);
}

#[test]
fn test_parse_datetime_invalid() {
    let err = parse_datetime("yesterday").unwrap_err();
    assert!(err.is_soft());
}

// ============================================================================
// Epoch Converter Tests
// ============================================================================

#[test]
fn test_epoch_parse_and_format() {
    let converter = EpochValueConverter::new();

    assert_eq!(converter.parse_value(&json!(1609459200)).unwrap(), dt("2021-01-01"));
    assert_eq!(converter.parse_value(&json!("1609459200")).unwrap(), dt("2021-01-01"));
    assert_eq!(converter.parse_value(&json!(1609459200.9)).unwrap(), dt("2021-01-01"));
    assert_eq!(converter.output_format(&dt("2021-01-01")), json!(1609459200));
}

#[test]
fn test_epoch_rejects_non_numeric() {
    let converter = EpochValueConverter::new();

    let err = converter.parse_value(&json!("2021-01-01")).unwrap_err();
    assert!(matches!(err, Error::ValueParse { .. }));
    assert!(converter.parse_value(&json!(null)).is_err());
}

#[test]
fn test_epoch_zero_and_increment() {
    let converter = EpochValueConverter::new();

    assert_eq!(converter.zero_value(), ts(0));
    assert_eq!(converter.increment(&ts(10)), ts(11));
    assert_eq!(
        converter.increment(&DateTime::<Utc>::MAX_UTC),
        DateTime::<Utc>::MAX_UTC
    );
}

// ============================================================================
// ISO Millis Converter Tests
// ============================================================================

#[test]
fn test_iso_millis_format() {
    let converter = IsoMillisConverter::new();

    assert_eq!(
        converter.output_format(&dt("2021-01-01T10:00:00.5Z")),
        json!("2021-01-01T10:00:00.500Z")
    );
    assert_eq!(
        converter.output_format(&converter.zero_value()),
        json!("0001-01-01T00:00:00.000Z")
    );
}

#[test]
fn test_iso_millis_rejects_numbers() {
    let converter = IsoMillisConverter::new();
    assert!(converter.parse_value(&json!(1609459200)).is_err());
}

#[test]
fn test_iso_millis_increment_uses_granularity() {
    let base = dt("2021-01-01T00:00:00Z");

    let fine = IsoMillisConverter::new();
    assert_eq!(fine.increment(&base), base + Duration::milliseconds(1));

    let coarse = IsoMillisConverter::new().with_cursor_granularity(Some(Duration::seconds(1)));
    assert_eq!(coarse.increment(&base), base + Duration::seconds(1));
}

// ============================================================================
// Custom Format Converter Tests
// ============================================================================

#[test]
fn test_custom_format_date_only() {
    let converter = CustomFormatConverter::new("%Y-%m-%d").unwrap();

    assert_eq!(converter.parse_value(&json!("2021-03-04")).unwrap(), dt("2021-03-04"));
    assert_eq!(converter.output_format(&dt("2021-03-04T12:00:00Z")), json!("2021-03-04"));
    assert_eq!(converter.zero_value(), ts(0));
    assert_eq!(converter.datetime_format(), "%Y-%m-%d");
}

#[test]
fn test_custom_format_input_formats() {
    let converter = CustomFormatConverter::new("%Y-%m-%dT%H:%M:%S")
        .unwrap()
        .with_input_formats(vec!["%d/%m/%Y".to_string(), "%s".to_string()])
        .unwrap();

    assert_eq!(converter.parse_value(&json!("04/03/2021")).unwrap(), dt("2021-03-04"));
    assert_eq!(converter.parse_value(&json!(1609459200)).unwrap(), dt("2021-01-01"));
    assert_eq!(
        converter.parse_value(&json!("2021-03-04T05:06:07")).unwrap(),
        dt("2021-03-04T05:06:07Z")
    );
}

#[test]
fn test_custom_format_mismatch() {
    let converter = CustomFormatConverter::new("%Y-%m-%d").unwrap();
    let err = converter.parse_value(&json!("March 4th")).unwrap_err();
    assert!(err.is_soft());
}

#[test]
fn test_custom_format_invalid_format() {
    let err = CustomFormatConverter::new("%Y-%m-%d %").unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test_case(0 ; "epoch zero")]
#[test_case(1609459200 ; "new year 2021")]
#[test_case(1700000123 ; "arbitrary second")]
fn test_parse_format_round_trip(secs: i64) {
    let value = ts(secs);

    let epoch = EpochValueConverter::new();
    assert_eq!(epoch.parse_value(&epoch.output_format(&value)).unwrap(), value);

    let iso = IsoMillisConverter::new();
    assert_eq!(iso.parse_value(&iso.output_format(&value)).unwrap(), value);

    let custom = CustomFormatConverter::new("%Y-%m-%d %H:%M:%S").unwrap();
    assert_eq!(custom.parse_value(&custom.output_format(&value)).unwrap(), value);
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_adjacent_intervals() {
    let converter = EpochValueConverter::new();
    let merged = converter.merge_intervals(vec![interval(0, 10), interval(11, 20)]);

    assert_eq!(merged, vec![interval(0, 20)]);
}

#[test]
fn test_merge_keeps_gaps() {
    let converter = EpochValueConverter::new();
    let merged = converter.merge_intervals(vec![interval(12, 20), interval(0, 10)]);

    assert_eq!(merged, vec![interval(0, 10), interval(12, 20)]);
}

#[test]
fn test_merge_overlapping_and_contained() {
    let converter = EpochValueConverter::new();
    let merged =
        converter.merge_intervals(vec![interval(0, 10), interval(5, 15), interval(2, 3)]);

    assert_eq!(merged, vec![interval(0, 15)]);
}

#[test]
fn test_merge_keeps_highest_most_recent() {
    let converter = EpochValueConverter::new();
    let merged = converter.merge_intervals(vec![
        interval(0, 10).with_most_recent(Some(ts(9))),
        interval(10, 20),
        interval(15, 30).with_most_recent(Some(ts(25))),
    ]);

    assert_eq!(merged, vec![interval(0, 30).with_most_recent(Some(ts(25)))]);
}

#[test]
fn test_merge_is_idempotent_and_order_independent() {
    let converter = EpochValueConverter::new();
    let intervals = vec![
        interval(40, 50),
        interval(0, 10).with_most_recent(Some(ts(4))),
        interval(11, 12),
        interval(30, 35),
        interval(33, 41).with_most_recent(Some(ts(41))),
    ];

    let once = converter.merge_intervals(intervals.clone());
    let twice = converter.merge_intervals(once.clone());
    assert_eq!(once, twice);

    let mut reversed = intervals;
    reversed.reverse();
    assert_eq!(converter.merge_intervals(reversed), once);

    assert_eq!(
        once,
        vec![
            interval(0, 12).with_most_recent(Some(ts(4))),
            interval(30, 50).with_most_recent(Some(ts(41))),
        ]
    );
}

// ============================================================================
// Wire Format Tests
// ============================================================================

#[test]
fn test_serialize_wire_format() {
    let converter = EpochValueConverter::new();
    let state = ConcurrentState::new(vec![
        interval(0, 10).with_most_recent(Some(ts(7))),
        interval(20, 30),
    ]);

    assert_eq!(
        converter.serialize(&state),
        json!({
            "state_type": "date-range",
            "slices": [
                {"start": 0, "end": 10, "most_recent_cursor_value": 7},
                {"start": 20, "end": 30},
            ]
        })
    );
}

#[test]
fn test_deserialize_wire_format() {
    let converter = IsoMillisConverter::new();
    let raw = json!({
        "state_type": "date-range",
        "slices": [{
            "start": "2021-01-01T00:00:00.000Z",
            "end": "2021-01-02T00:00:00.000Z",
            "most_recent_cursor_value": null,
        }],
        "legacy": {"updated_at": "2021-01-02"},
    });

    let state = converter.deserialize(&raw).unwrap();
    assert_eq!(
        state.intervals,
        vec![Interval::new(dt("2021-01-01"), dt("2021-01-02"))]
    );
    assert_eq!(
        state.legacy,
        json!({"updated_at": "2021-01-02"}).as_object().cloned()
    );
    assert!(state.covers(&dt("2021-01-01T12:00:00Z")));
    assert!(!state.covers(&dt("2021-01-03")));
}

#[test]
fn test_deserialize_rejects_bad_values() {
    let converter = EpochValueConverter::new();

    let bad_type = json!({"state_type": "date-range", "slices": "nope"});
    assert!(matches!(
        converter.deserialize(&bad_type),
        Err(Error::JsonParse(_))
    ));

    let bad_value = json!({"state_type": "date-range", "slices": [{"start": "x", "end": 1}]});
    assert!(converter.deserialize(&bad_value).is_err());
}

#[test]
fn test_is_state_compatible() {
    let converter = EpochValueConverter::new();

    assert!(converter.is_state_compatible(&json!({"state_type": "date-range", "slices": []})));
    assert!(!converter.is_state_compatible(&json!({"updated_at": 10})));
    assert!(!converter.is_state_compatible(&json!({"state_type": "per-partition"})));
    assert!(!converter.is_state_compatible(&json!(null)));
}

// ============================================================================
// Legacy Migration Tests
// ============================================================================

#[test]
fn test_legacy_state_bootstrap() {
    let converter = IsoMillisConverter::new();
    let field = CursorField::new("updated_at");
    let raw = json!({"updated_at": "2021-01-01T00:00:00Z"});

    let (low_water_mark, state) = converter
        .convert_from_sequential_state(&field, &raw, None)
        .unwrap();

    assert_eq!(low_water_mark, dt("2021-01-01"));
    assert_eq!(
        state.intervals,
        vec![Interval::new(dt("2021-01-01"), dt("2021-01-01"))
            .with_most_recent(Some(dt("2021-01-01")))]
    );
    assert_eq!(state.legacy, raw.as_object().cloned());
}

#[test]
fn test_legacy_state_with_earlier_start() {
    let converter = IsoMillisConverter::new();
    let field = CursorField::new("updated_at");
    let raw = json!({"updated_at": "2021-01-01T00:00:00Z"});
    let start = dt("2020-06-01");

    let (low_water_mark, state) = converter
        .convert_from_sequential_state(&field, &raw, Some(&start))
        .unwrap();

    assert_eq!(low_water_mark, dt("2021-01-01"));
    assert_eq!(state.intervals[0].start, start);
    assert_eq!(state.intervals[0].end, dt("2021-01-01"));
}

#[test]
fn test_legacy_state_older_than_start() {
    let converter = EpochValueConverter::new();
    let field = CursorField::new("updated_at");
    let raw = json!({"updated_at": 100});

    let (low_water_mark, state) = converter
        .convert_from_sequential_state(&field, &raw, Some(&ts(500)))
        .unwrap();

    assert_eq!(low_water_mark, ts(500));
    assert_eq!(
        state.intervals,
        vec![interval(500, 500).with_most_recent(Some(ts(500)))]
    );
}

#[test]
fn test_empty_state_bootstraps_from_zero() {
    let converter = EpochValueConverter::new();
    let field = CursorField::new("updated_at");

    let (low_water_mark, state) = converter
        .convert_from_sequential_state(&field, &json!(null), None)
        .unwrap();

    assert_eq!(low_water_mark, ts(0));
    assert_eq!(state.intervals, vec![interval(0, 0).with_most_recent(Some(ts(0)))]);
    assert!(state.legacy.is_none());
}

#[test]
fn test_compatible_state_is_deserialized() {
    let converter = EpochValueConverter::new();
    let field = CursorField::new("updated_at");
    let raw = json!({"state_type": "date-range", "slices": [{"start": 0, "end": 10}]});

    let (_, state) = converter
        .convert_from_sequential_state(&field, &raw, None)
        .unwrap();

    assert_eq!(state.intervals, vec![interval(0, 10)]);
}

#[test]
fn test_legacy_state_must_be_object() {
    let converter = EpochValueConverter::new();
    let field = CursorField::new("updated_at");

    assert!(converter
        .convert_from_sequential_state(&field, &json!([1, 2]), None)
        .is_err());
}

// ============================================================================
// State Message Tests
// ============================================================================

#[test]
fn test_state_message_interval_format() {
    let converter = EpochValueConverter::new();
    let field = CursorField::new("updated_at");
    let state = ConcurrentState::new(vec![interval(0, 10)]);

    let message = converter.convert_to_state_message(&field, &state);
    assert_eq!(message["state_type"], json!("date-range"));
}

#[test]
fn test_state_message_legacy_format() {
    let converter = EpochValueConverter::new().with_sequential_state(true);
    let field = CursorField::new("updated_at");
    let state = ConcurrentState::new(vec![
        interval(11, 20).with_most_recent(Some(ts(18))),
        interval(0, 10),
        interval(40, 50).with_most_recent(Some(ts(45))),
    ])
    .with_legacy(json!({"updated_at": 3, "other": "kept"}).as_object().cloned());

    assert_eq!(
        converter.convert_to_state_message(&field, &state),
        json!({"updated_at": 18, "other": "kept"})
    );
}

#[test]
fn test_state_message_legacy_falls_back_to_start() {
    let converter = EpochValueConverter::new().with_sequential_state(true);
    let field = CursorField::new("updated_at");
    let state = ConcurrentState::new(vec![interval(5, 10)]);

    assert_eq!(
        converter.convert_to_state_message(&field, &state),
        json!({"updated_at": 5})
    );
}

// ============================================================================
// Persisted State Tests
// ============================================================================

#[test]
fn test_state_document_serde() {
    let mut state = State::new();
    assert!(state.is_empty());

    state.set_stream("users", json!({"updated_at": 1}));
    assert_eq!(state.len(), 1);
    assert_eq!(state.get_stream("users"), Some(&json!({"updated_at": 1})));

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json, json!({"streams": {"users": {"updated_at": 1}}}));
}
