//! Tests for cursors

use super::*;
use crate::clamping::DayClampingStrategy;
use crate::config::{ClampingConfig, ClampingTarget, IncrementalConfig, SliceBoundaryFields};
use crate::engine::MemorySink;
use crate::error::Error;
use crate::partition::StaticPartition;
use crate::state::{
    fixed_end_provider, EpochValueConverter, Interval, IsoMillisConverter,
};
use crate::types::SyncMode;
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const STREAM: &str = "gods";
const CURSOR_KEY: &str = "a_cursor_field_key";
const LOWER: &str = "lower_boundary";
const UPPER: &str = "upper_boundary";

fn ts(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap()
}

fn iso(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn epoch_builder(sequential: bool) -> ConcurrentCursorBuilder<DateTime<Utc>> {
    ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(EpochValueConverter::new().with_sequential_state(sequential)),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(ts(50)),
    )
    .with_slice_boundary_fields(LOWER, UPPER)
}

fn epoch_cursor(state: JsonValue, sink: &Arc<MemorySink>) -> ConcurrentCursor<DateTime<Utc>> {
    epoch_builder(true).build(&state, sink.clone()).unwrap()
}

fn boundary_slice(lower: i64, upper: i64) -> Slice {
    Slice::from_bounds(LOWER, json!(lower), UPPER, json!(upper))
}

fn partition(slice: Option<Slice>) -> StaticPartition {
    StaticPartition::new(STREAM, slice, vec![])
}

fn record(value: i64, slice: Option<Slice>) -> Record {
    let record = Record::new(json!({ CURSOR_KEY: value }));
    match slice {
        Some(slice) => record.with_slice(slice),
        None => record,
    }
}

fn date_range(slices: JsonValue) -> JsonValue {
    json!({ "state_type": "date-range", "slices": slices })
}

fn bounds(slices: &[Slice], lower: &str, upper: &str) -> Vec<(JsonValue, JsonValue)> {
    slices
        .iter()
        .map(|s| (s.cursor_slice[lower].clone(), s.cursor_slice[upper].clone()))
        .collect()
}

fn epoch_bounds(slices: &[Slice]) -> Vec<(JsonValue, JsonValue)> {
    bounds(slices, LOWER, UPPER)
}

fn pairs(expected: &[(i64, i64)]) -> Vec<(JsonValue, JsonValue)> {
    expected.iter().map(|(a, b)| (json!(a), json!(b))).collect()
}

// ============================================================================
// Closing partitions
// ============================================================================

#[test]
fn test_close_partition_emits_legacy_state() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    cursor.close_partition(&partition(Some(boundary_slice(12, 30)))).unwrap();

    assert_eq!(sink.states(), vec![json!({ CURSOR_KEY: 0 })]);
}

#[test]
fn test_close_partition_emits_interval_state() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false).build(&json!({}), sink.clone()).unwrap();

    cursor.close_partition(&partition(Some(boundary_slice(12, 30)))).unwrap();

    assert_eq!(
        sink.states(),
        vec![date_range(json!([
            { "start": 0, "end": 0, "most_recent_cursor_value": 0 },
            { "start": 12, "end": 30 },
        ]))]
    );
}

#[test]
fn test_close_partition_merges_with_bootstrap_interval() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    cursor.close_partition(&partition(Some(boundary_slice(0, 30)))).unwrap();

    assert_eq!(cursor.concurrent_state().intervals.len(), 1);
    assert_eq!(cursor.concurrent_state().intervals[0].end, ts(30));
    assert_eq!(sink.last_state(), Some(json!({ CURSOR_KEY: 0 })));
}

#[test]
fn test_close_partition_with_boundaries_ignores_records_of_other_slices() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    cursor.observe(&record(9_999_999_999, None));
    cursor.close_partition(&partition(Some(boundary_slice(12, 30)))).unwrap();

    assert_eq!(sink.states(), vec![json!({ CURSOR_KEY: 0 })]);
}

#[test]
fn test_close_partition_keeps_most_recent_of_its_slice() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false).build(&json!(null), sink.clone()).unwrap();
    let slice = boundary_slice(12, 30);

    cursor.observe(&record(20, Some(slice.clone())));
    cursor.observe(&record(25, Some(slice.clone())));
    cursor.close_partition(&partition(Some(slice))).unwrap();

    let state = cursor.concurrent_state();
    assert_eq!(
        state.intervals.last(),
        Some(&Interval::new(ts(12), ts(30)).with_most_recent(Some(ts(25))))
    );
}

#[test]
fn test_close_partition_without_boundaries_uses_observed_value() {
    let sink = Arc::new(MemorySink::new());
    let cursor = ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(EpochValueConverter::new().with_sequential_state(true)),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(ts(50)),
    )
    .build(&json!({}), sink.clone())
    .unwrap();

    cursor.observe(&record(10, None));
    cursor.close_partition(&partition(None)).unwrap();

    assert_eq!(sink.states(), vec![json!({ CURSOR_KEY: 10 })]);
}

#[test]
fn test_close_second_partition_without_boundaries_fails() {
    let sink = Arc::new(MemorySink::new());
    let cursor = ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(EpochValueConverter::new().with_sequential_state(true)),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(ts(50)),
    )
    .build(&json!({}), sink.clone())
    .unwrap();

    cursor.observe(&record(10, None));
    cursor.close_partition(&partition(None)).unwrap();
    let err = cursor.close_partition(&partition(None)).unwrap_err();

    assert!(matches!(err, Error::InvariantViolation { .. }));
    assert_eq!(sink.states().len(), 1);
}

#[test]
fn test_close_partition_without_records_emits_nothing() {
    let sink = Arc::new(MemorySink::new());
    let cursor = ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(EpochValueConverter::new()),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(ts(50)),
    )
    .build(&json!({}), sink.clone())
    .unwrap();

    cursor.close_partition(&partition(None)).unwrap();

    assert!(sink.is_empty());
}

#[test]
fn test_close_partition_without_slice_fails_with_boundaries() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    let err = cursor.close_partition(&partition(None)).unwrap_err();

    assert!(matches!(err, Error::MissingSliceBoundary { key } if key == LOWER));
    assert!(sink.is_empty());
}

#[test]
fn test_close_partition_with_other_slice_keys_fails() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);
    let slice = Slice::from_bounds("not_matching_key", json!(0), UPPER, json!(10));

    let err = cursor.close_partition(&partition(Some(slice))).unwrap_err();

    assert!(matches!(err, Error::MissingSliceBoundary { .. }));
}

// ============================================================================
// Slice generation
// ============================================================================

#[test]
fn test_slices_without_state_start_at_configured_start() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false)
        .with_start(Some(ts(10)))
        .build(&json!(null), sink)
        .unwrap();

    assert_eq!(epoch_bounds(&cursor.stream_slices()), pairs(&[(10, 50)]));
}

#[test]
fn test_slices_resume_after_synced_interval() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([{ "start": 0, "end": 20 }]));
    let cursor = epoch_builder(false)
        .with_start(Some(ts(0)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(epoch_bounds(&cursor.stream_slices()), pairs(&[(20, 50)]));
}

#[test]
fn test_slices_start_after_synced_intervals() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([{ "start": 0, "end": 20 }]));
    let cursor = epoch_builder(false)
        .with_start(Some(ts(30)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(epoch_bounds(&cursor.stream_slices()), pairs(&[(30, 50)]));
}

#[test]
fn test_slices_skip_gaps_before_start() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([
        { "start": 0, "end": 10 },
        { "start": 15, "end": 20 },
    ]));
    let cursor = epoch_builder(false)
        .with_start(Some(ts(30)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(epoch_bounds(&cursor.stream_slices()), pairs(&[(30, 50)]));
}

#[test]
fn test_slices_split_by_slice_range() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([{ "start": 0, "end": 20 }]));
    let cursor = epoch_builder(false)
        .with_slice_range(Some(Duration::seconds(10)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(20, 30), (30, 40), (40, 50)])
    );
}

#[test]
fn test_slices_fill_gap_between_intervals() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([
        { "start": 0, "end": 30 },
        { "start": 40, "end": 50 },
    ]));
    let cursor = epoch_builder(false)
        .with_slice_range(Some(Duration::seconds(10)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(epoch_bounds(&cursor.stream_slices()), pairs(&[(30, 40)]));
}

#[test]
fn test_slices_saturate_overflowing_slice_range_to_end() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([
        { "start": 0, "end": 10 },
        { "start": 20, "end": 30 },
    ]));
    let cursor = epoch_builder(false)
        .with_slice_range(Some(Duration::MAX))
        .build(&state, sink)
        .unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(10, 20), (30, 50)])
    );
}

#[test]
fn test_slices_fill_every_gap_without_start() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([
        { "start": 0, "end": 10 },
        { "start": 20, "end": 25 },
        { "start": 30, "end": 40 },
    ]));
    let cursor = epoch_builder(false).build(&state, sink).unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(10, 20), (25, 30), (40, 50)])
    );
}

#[test]
fn test_slices_apply_lookback_to_last_slice_only() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([
        { "start": 0, "end": 20 },
        { "start": 30, "end": 40 },
    ]));
    let cursor = epoch_builder(false)
        .with_lookback_window(Some(Duration::seconds(10)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(20, 30), (30, 50)])
    );
}

#[test]
fn test_slices_cover_head_before_first_interval() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([{ "start": 10, "end": 20 }]));
    let cursor = epoch_builder(false)
        .with_start(Some(ts(0)))
        .build(&state, sink)
        .unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(0, 10), (20, 50)])
    );
}

#[test]
fn test_slices_with_granularity_do_not_overlap() {
    let sink = Arc::new(MemorySink::new());
    let cursor = ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(IsoMillisConverter::new()),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(iso("2021-01-03T00:00:00Z")),
    )
    .with_start(Some(iso("2021-01-01T00:00:00Z")))
    .with_slice_range(Some(Duration::days(1)))
    .with_cursor_granularity(Some(Duration::seconds(1)))
    .build(&json!(null), sink)
    .unwrap();

    let slices = cursor.stream_slices();

    assert_eq!(
        bounds(&slices, DEFAULT_START_KEY, DEFAULT_END_KEY),
        vec![
            (
                json!("2021-01-01T00:00:00.000Z"),
                json!("2021-01-01T23:59:59.000Z")
            ),
            (
                json!("2021-01-02T00:00:00.000Z"),
                json!("2021-01-03T00:00:00.000Z")
            ),
        ]
    );
}

#[test]
fn test_slices_with_clamping_align_to_days() {
    let sink = Arc::new(MemorySink::new());
    let cursor = ConcurrentCursor::builder(
        StreamDescriptor::new(STREAM),
        Arc::new(IsoMillisConverter::new()),
        CursorField::new(CURSOR_KEY),
        fixed_end_provider(iso("2024-01-04T00:00:00Z")),
    )
    .with_start(Some(iso("2024-01-01T10:00:00Z")))
    .with_slice_range(Some(Duration::days(1)))
    .with_cursor_granularity(Some(Duration::seconds(1)))
    .with_clamping_strategy(Arc::new(DayClampingStrategy::ceiling()))
    .build(&json!(null), sink)
    .unwrap();

    assert_eq!(
        bounds(&cursor.stream_slices(), DEFAULT_START_KEY, DEFAULT_END_KEY),
        vec![
            (
                json!("2024-01-02T00:00:00.000Z"),
                json!("2024-01-02T23:59:59.000Z")
            ),
            (
                json!("2024-01-03T00:00:00.000Z"),
                json!("2024-01-04T00:00:00.000Z")
            ),
        ]
    );
}

#[test]
fn test_slices_are_empty_when_fully_synced() {
    let sink = Arc::new(MemorySink::new());
    let state = date_range(json!([{ "start": 0, "end": 50 }]));
    let cursor = epoch_builder(false).build(&state, sink).unwrap();

    assert!(cursor.stream_slices().is_empty());
}

#[test]
fn test_closed_partitions_are_not_sliced_again() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false)
        .with_slice_range(Some(Duration::seconds(10)))
        .build(&date_range(json!([{ "start": 0, "end": 20 }])), sink)
        .unwrap();

    let first_pass = cursor.stream_slices();
    cursor
        .close_partition(&StaticPartition::new(STREAM, Some(first_pass[1].clone()), vec![]))
        .unwrap();

    assert_eq!(
        epoch_bounds(&cursor.stream_slices()),
        pairs(&[(20, 30), (40, 50)])
    );
}

// ============================================================================
// Record filtering and slice reduction
// ============================================================================

#[test]
fn test_should_be_synced() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false)
        .with_start(Some(ts(10)))
        .build(&json!(null), sink)
        .unwrap();

    assert!(cursor.should_be_synced(&record(10, None)));
    assert!(cursor.should_be_synced(&record(50, None)));
    assert!(!cursor.should_be_synced(&record(9, None)));
    assert!(!cursor.should_be_synced(&record(51, None)));
}

#[test]
fn test_record_without_cursor_value_is_synced() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    assert!(cursor.should_be_synced(&Record::new(json!({ "id": 1 }))));
    assert!(cursor.should_be_synced(&Record::new(json!({ CURSOR_KEY: null }))));

    cursor.observe(&Record::new(json!({ "id": 1 })));
    cursor.close_partition(&partition(Some(boundary_slice(0, 10)))).unwrap();
    assert_eq!(sink.states(), vec![json!({ CURSOR_KEY: 0 })]);
}

#[test]
fn test_reduce_slice_range_starts_at_observed_value() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);
    let slice = boundary_slice(0, 40).with_partition_value("parent_id", "p1");

    cursor.observe(&record(15, Some(slice.clone())));
    cursor.observe(&record(25, Some(slice.clone())));

    let reduced = cursor.reduce_slice_range(&slice);
    assert_eq!(reduced.get(LOWER), Some(&json!(25)));
    assert_eq!(reduced.get(UPPER), Some(&json!(40)));
    assert_eq!(reduced.partition.get("parent_id"), Some(&json!("p1")));
    assert!(cursor.is_ascending_order());
}

#[test]
fn test_reduce_slice_range_without_records_keeps_slice() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);
    let slice = boundary_slice(0, 40);

    assert_eq!(cursor.reduce_slice_range(&slice), slice);
}

#[test]
fn test_out_of_order_records_are_detected() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({}), &sink);

    cursor.observe(&record(20, None));
    cursor.observe(&record(10, None));

    assert!(!cursor.is_ascending_order());
}

// ============================================================================
// Prior state
// ============================================================================

#[test]
fn test_invalid_prior_state_is_rejected() {
    let sink = Arc::new(MemorySink::new());

    let err = epoch_builder(false).build(&json!([1, 2]), sink.clone()).unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));

    let err = epoch_builder(false)
        .build(&json!({ CURSOR_KEY: "not a number" }), sink)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn test_low_water_mark_from_state() {
    let sink = Arc::new(MemorySink::new());

    let legacy = epoch_builder(false).build(&json!({ CURSOR_KEY: 20 }), sink.clone()).unwrap();
    assert_eq!(legacy.low_water_mark(), &ts(20));

    let compatible = epoch_builder(false)
        .build(
            &date_range(json!([{ "start": 0, "end": 30, "most_recent_cursor_value": 25 }])),
            sink.clone(),
        )
        .unwrap();
    assert_eq!(compatible.low_water_mark(), &ts(25));

    let empty = epoch_builder(false)
        .with_start(Some(ts(5)))
        .build(&date_range(json!([])), sink)
        .unwrap();
    assert_eq!(empty.low_water_mark(), &ts(5));
}

#[test]
fn test_ensure_state_emitted_without_partitions() {
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_cursor(json!({ CURSOR_KEY: 20 }), &sink);

    cursor.ensure_at_least_one_state_emitted();

    assert_eq!(sink.states(), vec![json!({ CURSOR_KEY: 20 })]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_close_converges_to_one_interval() {
    const WORKERS: i64 = 8;
    let sink = Arc::new(MemorySink::new());
    let cursor = epoch_builder(false)
        .build(&date_range(json!([])), sink.clone())
        .unwrap();

    std::thread::scope(|scope| {
        for i in 0..WORKERS {
            let cursor = &cursor;
            scope.spawn(move || {
                let slice = boundary_slice(i * 10, i * 10 + 9);
                cursor.observe(&record(i * 10 + 5, Some(slice.clone())));
                cursor
                    .close_partition(&StaticPartition::new(STREAM, Some(slice), vec![]))
                    .unwrap();
            });
        }
    });

    let state = cursor.concurrent_state();
    assert_eq!(
        state.intervals,
        vec![Interval::new(ts(0), ts(WORKERS * 10 - 1))
            .with_most_recent(Some(ts((WORKERS - 1) * 10 + 5)))]
    );
    assert_eq!(sink.states().len(), WORKERS as usize);
    assert_eq!(sink.last_state(), Some(cursor.state()));
}

// ============================================================================
// Final state cursor
// ============================================================================

#[test]
fn test_final_state_cursor_emits_sentinel() {
    let sink = Arc::new(MemorySink::new());
    let cursor = FinalStateCursor::new(StreamDescriptor::new(STREAM), sink.clone());

    cursor.observe(&record(10, None));
    cursor.close_partition(&partition(None)).unwrap();
    assert!(sink.is_empty());
    assert!(cursor.should_be_synced(&record(10, None)));
    assert_eq!(cursor.stream_slices(), vec![Slice::new()]);

    cursor.ensure_at_least_one_state_emitted();
    assert_eq!(sink.states(), vec![json!({ NO_CURSOR_STATE_KEY: true })]);
}

// ============================================================================
// Factory
// ============================================================================

fn users_config() -> IncrementalConfig {
    let mut config = IncrementalConfig::new("users", "updated_at");
    config.start = Some("2024-01-01T10:00:00.000Z".to_string());
    config
}

#[test]
fn test_factory_full_refresh_uses_final_state_cursor() {
    let sink = Arc::new(MemorySink::new());
    let mut config = users_config();
    config.sync_mode = SyncMode::FullRefresh;

    let cursor = CursorFactory::new()
        .create_cursor(&config, &json!(null), sink.clone())
        .unwrap();
    cursor.ensure_at_least_one_state_emitted();

    assert_eq!(sink.states(), vec![json!({ NO_CURSOR_STATE_KEY: true })]);
}

#[test]
fn test_factory_builds_cursor_with_clamping() {
    let sink = Arc::new(MemorySink::new());
    let mut config = users_config();
    config.step = Some("P1D".to_string());
    config.cursor_granularity = Some("PT1S".to_string());
    config.clamping = Some(ClampingConfig {
        target: ClampingTarget::Day,
        weekday: None,
        ceiling: true,
    });

    let cursor = CursorFactory::new()
        .with_end_provider(fixed_end_provider(iso("2024-01-04T10:00:00Z")))
        .create_concurrent_cursor(&config, &json!(null), sink)
        .unwrap();

    assert_eq!(
        bounds(&cursor.stream_slices(), DEFAULT_START_KEY, DEFAULT_END_KEY),
        vec![
            (
                json!("2024-01-02T00:00:00.000Z"),
                json!("2024-01-02T23:59:59.000Z")
            ),
            (
                json!("2024-01-03T00:00:00.000Z"),
                json!("2024-01-03T23:59:59.000Z")
            ),
        ]
    );
}

#[test]
fn test_factory_uses_boundary_fields_and_legacy_output() {
    let sink = Arc::new(MemorySink::new());
    let mut config = users_config();
    config.end = Some("2024-01-02T00:00:00.000Z".to_string());
    config.legacy_state_output = true;
    config.slice_boundary_fields = Some(SliceBoundaryFields {
        start_field: "from".to_string(),
        end_field: "to".to_string(),
    });

    let cursor = CursorFactory::new()
        .create_cursor(&config, &json!({ "updated_at": "2024-01-01T12:00:00.000Z" }), sink.clone())
        .unwrap();

    let slices = cursor.stream_slices();
    assert_eq!(
        bounds(&slices, "from", "to"),
        vec![(
            json!("2024-01-01T12:00:00.000Z"),
            json!("2024-01-02T00:00:00.000Z")
        )]
    );

    cursor
        .close_partition(&StaticPartition::new("users", Some(slices[0].clone()), vec![]))
        .unwrap();
    assert_eq!(
        sink.last_state(),
        Some(json!({ "updated_at": "2024-01-01T12:00:00.000Z" }))
    );
}

#[test]
fn test_factory_rejects_unparseable_start() {
    let sink = Arc::new(MemorySink::new());
    let mut config = users_config();
    config.start = Some("yesterday".to_string());

    let Err(err) = CursorFactory::new().create_cursor(&config, &json!(null), sink) else {
        panic!("expected an unparseable start to be rejected");
    };

    assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "start"));
}
