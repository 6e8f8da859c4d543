//! Concurrent cursor
//!
//! Tracks which parts of the cursor domain have been fully synced while
//! partitions complete in any order, and derives the next slices to read
//! from the gaps between synced intervals.

use super::field::CursorField;
use super::{Cursor, DEFAULT_END_KEY, DEFAULT_START_KEY};
use crate::clamping::{ClampingStrategy, NoClamping};
use crate::engine::{Message, MessageSink};
use crate::error::{Error, Result};
use crate::partition::{Partition, Record, Slice, SliceKey};
use crate::state::{ConcurrentState, CursorValue, EndProvider, Interval, StateConverter};
use crate::types::{JsonValue, StreamDescriptor};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ConcurrentCursor`]
pub struct ConcurrentCursorBuilder<V: CursorValue> {
    stream: StreamDescriptor,
    converter: Arc<dyn StateConverter<Value = V>>,
    cursor_field: CursorField,
    end_provider: EndProvider<V>,
    slice_boundary_fields: Option<(String, String)>,
    start: Option<V>,
    lookback_window: Option<V::Gap>,
    slice_range: Option<V::Gap>,
    cursor_granularity: Option<V::Gap>,
    clamping_strategy: Arc<dyn ClampingStrategy<V>>,
}

impl<V: CursorValue> ConcurrentCursorBuilder<V> {
    /// Slice keys holding the lower and upper cursor bound of a partition
    ///
    /// Without boundary fields a stream may close a single partition only,
    /// whose interval is derived from the observed records.
    #[must_use]
    pub fn with_slice_boundary_fields(
        mut self,
        start_field: impl Into<String>,
        end_field: impl Into<String>,
    ) -> Self {
        self.slice_boundary_fields = Some((start_field.into(), end_field.into()));
        self
    }

    /// Explicit sync start
    #[must_use]
    pub fn with_start(mut self, start: Option<V>) -> Self {
        self.start = start;
        self
    }

    /// Margin re-read before the end of the last synced interval
    #[must_use]
    pub fn with_lookback_window(mut self, lookback: Option<V::Gap>) -> Self {
        self.lookback_window = lookback;
        self
    }

    /// Maximum span of one slice
    #[must_use]
    pub fn with_slice_range(mut self, range: Option<V::Gap>) -> Self {
        self.slice_range = range;
        self
    }

    /// Smallest step of the cursor, used to keep slices non-overlapping
    #[must_use]
    pub fn with_cursor_granularity(mut self, granularity: Option<V::Gap>) -> Self {
        self.cursor_granularity = granularity;
        self
    }

    /// Strategy aligning slice boundaries
    #[must_use]
    pub fn with_clamping_strategy(mut self, strategy: Arc<dyn ClampingStrategy<V>>) -> Self {
        self.clamping_strategy = strategy;
        self
    }

    /// Build the cursor from the stream's prior checkpoint
    ///
    /// `prior_state` may be null, a legacy `{cursor_field: value}` object or
    /// an interval checkpoint. Anything else fails with `InvalidState`.
    pub fn build(
        self,
        prior_state: &JsonValue,
        sink: Arc<dyn MessageSink>,
    ) -> Result<ConcurrentCursor<V>> {
        let invalid = |e: Error| Error::invalid_state(self.stream.to_string(), e.to_string());

        let (low_water_mark, state) = if self.converter.is_state_compatible(prior_state) {
            let mut state = self.converter.deserialize(prior_state).map_err(invalid)?;
            state.intervals = self.converter.merge_intervals(state.intervals);

            let from_state = state.intervals.first().map(|first| {
                first
                    .most_recent_cursor_value
                    .clone()
                    .unwrap_or_else(|| first.end.clone())
            });
            let low_water_mark = from_state
                .or_else(|| self.start.clone())
                .unwrap_or_else(|| self.converter.zero_value());
            (low_water_mark, state)
        } else {
            self.converter
                .convert_from_sequential_state(&self.cursor_field, prior_state, self.start.as_ref())
                .map_err(invalid)?
        };

        debug!(
            stream = %self.stream,
            intervals = state.intervals.len(),
            "Cursor initialized at {:?}",
            low_water_mark
        );

        Ok(ConcurrentCursor {
            stream: self.stream,
            converter: self.converter,
            cursor_field: self.cursor_field,
            end_provider: self.end_provider,
            slice_boundary_fields: self.slice_boundary_fields,
            start: self.start,
            lookback_window: self.lookback_window,
            slice_range: self.slice_range,
            cursor_granularity: self.cursor_granularity,
            clamping_strategy: self.clamping_strategy,
            sink,
            low_water_mark,
            state: Mutex::new(state),
            observed: Mutex::new(HashMap::new()),
            has_closed_at_least_one_slice: AtomicBool::new(false),
            is_ascending_order: AtomicBool::new(true),
            missing_cursor_logged: AtomicBool::new(false),
        })
    }
}

// ============================================================================
// Concurrent Cursor
// ============================================================================

/// Interval-tracking cursor shared by concurrently running partitions
pub struct ConcurrentCursor<V: CursorValue> {
    stream: StreamDescriptor,
    converter: Arc<dyn StateConverter<Value = V>>,
    cursor_field: CursorField,
    end_provider: EndProvider<V>,
    slice_boundary_fields: Option<(String, String)>,
    start: Option<V>,
    lookback_window: Option<V::Gap>,
    slice_range: Option<V::Gap>,
    cursor_granularity: Option<V::Gap>,
    clamping_strategy: Arc<dyn ClampingStrategy<V>>,
    sink: Arc<dyn MessageSink>,
    /// Earliest value a sync starts from
    low_water_mark: V,
    /// Synced intervals; append, merge and publish happen under this lock
    state: Mutex<ConcurrentState<V>>,
    /// Highest cursor value observed per slice
    observed: Mutex<HashMap<SliceKey, V>>,
    has_closed_at_least_one_slice: AtomicBool,
    is_ascending_order: AtomicBool,
    missing_cursor_logged: AtomicBool,
}

impl<V: CursorValue> ConcurrentCursor<V> {
    /// Start building a cursor
    pub fn builder(
        stream: StreamDescriptor,
        converter: Arc<dyn StateConverter<Value = V>>,
        cursor_field: CursorField,
        end_provider: EndProvider<V>,
    ) -> ConcurrentCursorBuilder<V> {
        ConcurrentCursorBuilder {
            stream,
            converter,
            cursor_field,
            end_provider,
            slice_boundary_fields: None,
            start: None,
            lookback_window: None,
            slice_range: None,
            cursor_granularity: None,
            clamping_strategy: Arc::new(NoClamping::new()),
        }
    }

    /// The cursor field
    pub fn cursor_field(&self) -> &CursorField {
        &self.cursor_field
    }

    /// Earliest value a sync starts from
    pub fn low_water_mark(&self) -> &V {
        &self.low_water_mark
    }

    /// Snapshot of the synced intervals
    pub fn concurrent_state(&self) -> ConcurrentState<V> {
        self.state.lock().clone()
    }

    /// Whether records were observed in ascending cursor order so far
    pub fn is_ascending_order(&self) -> bool {
        self.is_ascending_order.load(Ordering::Relaxed)
    }

    /// Slice keys of the lower and upper bound of generated slices
    fn boundary_keys(&self) -> (&str, &str) {
        match &self.slice_boundary_fields {
            Some((start, end)) => (start.as_str(), end.as_str()),
            None => (DEFAULT_START_KEY, DEFAULT_END_KEY),
        }
    }

    fn extract_cursor_value(&self, record: &Record) -> Result<V> {
        let raw = self.cursor_field.extract_value(record)?;
        self.converter.parse_value(raw)
    }

    fn log_for_record_without_cursor_value(&self, error: &Error) {
        if !self.missing_cursor_logged.swap(true, Ordering::Relaxed) {
            warn!(
                stream = %self.stream,
                "Could not find cursor field `{}` in record ({error}). \
                 The incremental sync will assume it needs to be synced",
                self.cursor_field.key()
            );
        }
    }

    fn extract_from_slice(&self, slice: Option<&Slice>, key: &str) -> Result<V> {
        let raw = slice
            .and_then(|s| s.get(key))
            .ok_or_else(|| Error::missing_boundary(key))?;
        self.converter.parse_value(raw)
    }

    /// Interval covered by a finished partition, if any
    fn interval_for(
        &self,
        slice: Option<&Slice>,
        most_recent: Option<V>,
    ) -> Result<Option<Interval<V>>> {
        if let Some((start_field, end_field)) = &self.slice_boundary_fields {
            let interval = Interval::new(
                self.extract_from_slice(slice, start_field)?,
                self.extract_from_slice(slice, end_field)?,
            );
            return Ok(Some(interval.with_most_recent(most_recent)));
        }

        let Some(most_recent) = most_recent else {
            return Ok(None);
        };
        if self.has_closed_at_least_one_slice.load(Ordering::SeqCst) {
            return Err(Error::invariant(
                self.stream.to_string(),
                "slice boundary fields are not defined, so only one partition can be closed",
            ));
        }

        let start = self.low_water_mark.clone().min(most_recent.clone());
        Ok(Some(
            Interval::new(start, most_recent.clone()).with_most_recent(Some(most_recent)),
        ))
    }

    fn emit_state(&self, state: &ConcurrentState<V>) {
        let data = self
            .converter
            .convert_to_state_message(&self.cursor_field, state);
        debug!(stream = %self.stream, intervals = state.intervals.len(), "Emitting state");
        self.sink.publish(Message::state(self.stream.clone(), data));
    }

    // ========================================================================
    // Slice generation
    // ========================================================================

    fn add_gap_or(&self, value: &V, gap: &V::Gap, fallback: &V) -> V {
        value.checked_add_gap(gap).unwrap_or_else(|| fallback.clone())
    }

    fn without_granularity(&self, value: V) -> V {
        match &self.cursor_granularity {
            Some(granularity) => value.checked_sub_gap(granularity).unwrap_or(value),
            None => value,
        }
    }

    fn lower_boundary_of_last_slice(&self, end_of_last: &V) -> V {
        match &self.lookback_window {
            Some(lookback) => end_of_last
                .checked_sub_gap(lookback)
                .unwrap_or_else(|| self.converter.zero_value()),
            None => end_of_last.clone(),
        }
    }

    fn make_slice(&self, lower: &V, upper: &V) -> Slice {
        let (start_key, end_key) = self.boundary_keys();
        Slice::from_bounds(
            start_key,
            self.converter.output_format(lower),
            end_key,
            self.converter.output_format(upper),
        )
    }

    /// Split `[lower, upper]` into slices of at most `slice_range`
    fn split_per_slice_range(
        &self,
        lower: V,
        upper: &V,
        upper_is_end: bool,
        end: &V,
        slices: &mut Vec<Slice>,
    ) {
        if &lower >= upper {
            return;
        }
        let lower = match &self.start {
            Some(start) if upper < start => return,
            Some(start) if start > &lower => start.clone(),
            _ => lower,
        };
        if &lower >= upper {
            return;
        }

        let clamp = |value: &V| self.clamping_strategy.clamp(value);

        let Some(range) = self
            .slice_range
            .as_ref()
            .filter(|range| &self.add_gap_or(&lower, range, end) < upper)
        else {
            let (clamped_lower, clamped_upper) = (clamp(&lower), clamp(upper));
            if clamped_lower >= clamped_upper {
                return;
            }
            let end_value = if upper_is_end {
                clamped_upper
            } else {
                self.without_granularity(clamped_upper)
            };
            slices.push(self.make_slice(&clamped_lower, &end_value));
            return;
        };

        let mut current_lower = lower;
        loop {
            let current_upper = self.add_gap_or(&current_lower, range, end).min(upper.clone());
            let has_reached_upper = &current_upper >= upper;

            let clamped_upper = if &current_upper == upper {
                current_upper
            } else {
                clamp(&current_upper)
            };
            let clamped_lower = clamp(&current_lower);
            // clamping collapsed the slice
            if clamped_lower >= clamped_upper {
                break;
            }

            let end_value = if upper_is_end && has_reached_upper {
                clamped_upper.clone()
            } else {
                self.without_granularity(clamped_upper.clone())
            };
            slices.push(self.make_slice(&clamped_lower, &end_value));

            if has_reached_upper {
                break;
            }
            current_lower = clamped_upper;
        }
    }
}

impl<V: CursorValue> Cursor for ConcurrentCursor<V> {
    fn stream(&self) -> &StreamDescriptor {
        &self.stream
    }

    fn state(&self) -> JsonValue {
        let state = self.state.lock();
        self.converter
            .convert_to_state_message(&self.cursor_field, &state)
    }

    fn observe(&self, record: &Record) {
        let value = match self.extract_cursor_value(record) {
            Ok(value) => value,
            Err(e) => {
                self.log_for_record_without_cursor_value(&e);
                return;
            }
        };

        let mut observed = self.observed.lock();
        match observed.entry(record.slice_key()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() < value {
                    entry.insert(value);
                } else if *entry.get() > value {
                    self.is_ascending_order.store(false, Ordering::Relaxed);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    fn close_partition(&self, partition: &dyn Partition) -> Result<()> {
        let slice = partition.to_slice();
        let key = slice.map_or_else(SliceKey::top_level, Slice::key);
        let most_recent = self.observed.lock().get(&key).cloned();

        let mut state = self.state.lock();
        let interval = self.interval_for(slice, most_recent)?;
        self.has_closed_at_least_one_slice
            .store(true, Ordering::SeqCst);

        if let Some(interval) = interval {
            state.intervals.push(interval);
            let intervals = std::mem::take(&mut state.intervals);
            state.intervals = self.converter.merge_intervals(intervals);
            self.emit_state(&state);
        }
        Ok(())
    }

    fn ensure_at_least_one_state_emitted(&self) {
        let state = self.state.lock();
        self.emit_state(&state);
    }

    fn should_be_synced(&self, record: &Record) -> bool {
        match self.extract_cursor_value(record) {
            Ok(value) => self.low_water_mark <= value && value <= (self.end_provider)(),
            Err(e) => {
                self.log_for_record_without_cursor_value(&e);
                true
            }
        }
    }

    fn stream_slices(&self) -> Vec<Slice> {
        let intervals = {
            let mut state = self.state.lock();
            let intervals = std::mem::take(&mut state.intervals);
            state.intervals = self.converter.merge_intervals(intervals);
            state.intervals.clone()
        };
        let end = (self.end_provider)();
        let mut slices = Vec::new();

        let (Some(first), Some(last)) = (intervals.first(), intervals.last()) else {
            let lower = self
                .start
                .clone()
                .unwrap_or_else(|| self.low_water_mark.clone());
            self.split_per_slice_range(lower, &end, true, &end, &mut slices);
            return slices;
        };

        if let Some(start) = self.start.as_ref().filter(|start| *start < &first.start) {
            self.split_per_slice_range(start.clone(), &first.start, false, &end, &mut slices);
        }

        for pair in intervals.windows(2) {
            let lower = match &self.cursor_granularity {
                Some(granularity) => self.add_gap_or(&pair[0].end, granularity, &pair[0].end),
                None => pair[0].end.clone(),
            };
            self.split_per_slice_range(lower, &pair[1].start, false, &end, &mut slices);
        }

        let lower = self.lower_boundary_of_last_slice(&last.end);
        self.split_per_slice_range(lower, &end, true, &end, &mut slices);

        debug!(stream = %self.stream, count = slices.len(), "Generated slices");
        slices
    }

    fn reduce_slice_range(&self, slice: &Slice) -> Slice {
        if !self.is_ascending_order() {
            warn!(
                stream = %self.stream,
                "Attempting to reduce slice while records are not returned in incremental order might lead to missing records"
            );
        }

        let Some(observed) = self.observed.lock().get(&slice.key()).cloned() else {
            return slice.clone();
        };

        let (start_key, end_key) = self.boundary_keys();
        let mut cursor_slice = BTreeMap::new();
        cursor_slice.insert(start_key.to_string(), self.converter.output_format(&observed));
        if let Some(end) = slice.cursor_slice.get(end_key) {
            cursor_slice.insert(end_key.to_string(), end.clone());
        }

        Slice {
            partition: slice.partition.clone(),
            cursor_slice,
        }
    }
}

impl<V: CursorValue> fmt::Debug for ConcurrentCursor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentCursor")
            .field("stream", &self.stream)
            .field("converter", &self.converter)
            .field("cursor_field", &self.cursor_field)
            .field("slice_boundary_fields", &self.slice_boundary_fields)
            .field("start", &self.start)
            .field("low_water_mark", &self.low_water_mark)
            .field("clamping_strategy", &self.clamping_strategy)
            .finish_non_exhaustive()
    }
}
