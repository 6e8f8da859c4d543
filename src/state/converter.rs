//! State converter trait
//!
//! A converter knows how cursor values of one format are parsed, rendered
//! and stepped. Interval merging and the wire (de)serialization are shared
//! and built on top of those primitives.

use super::types::{
    ConcurrentState, Interval, StateType, WireInterval, WireState, STATE_TYPE_KEY,
};
use super::value::CursorValue;
use crate::cursor::CursorField;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::fmt;

/// Parses, formats and merges cursor values of one wire format
pub trait StateConverter: fmt::Debug + Send + Sync {
    /// In-memory cursor value
    type Value: CursorValue;

    /// Parse a raw wire value
    fn parse_value(&self, raw: &JsonValue) -> Result<Self::Value>;

    /// Render a value for the wire
    fn output_format(&self, value: &Self::Value) -> JsonValue;

    /// Lowest meaningful value of the domain
    fn zero_value(&self) -> Self::Value;

    /// Smallest representable step after `value`
    fn increment(&self, value: &Self::Value) -> Self::Value;

    /// Whether checkpoints are emitted in the legacy single-value format
    fn is_sequential_state(&self) -> bool;

    /// Whether `raw` already uses the interval format
    fn is_state_compatible(&self, raw: &JsonValue) -> bool {
        raw.get(STATE_TYPE_KEY).and_then(JsonValue::as_str)
            == Some(StateType::DateRange.as_str())
    }

    /// Sort intervals and coalesce overlapping or adjacent ones
    fn merge_intervals(
        &self,
        mut intervals: Vec<Interval<Self::Value>>,
    ) -> Vec<Interval<Self::Value>> {
        intervals.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));

        let mut merged: Vec<Interval<Self::Value>> = Vec::with_capacity(intervals.len());
        for current in intervals {
            match merged.last_mut() {
                Some(last) if self.increment(&last.end) >= current.start => {
                    if current.end > last.end {
                        last.end = current.end;
                    }
                    last.most_recent_cursor_value = match (
                        last.most_recent_cursor_value.take(),
                        current.most_recent_cursor_value,
                    ) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        (a, b) => a.or(b),
                    };
                }
                _ => merged.push(current),
            }
        }
        merged
    }

    /// Parse interval-format state
    fn deserialize(&self, raw: &JsonValue) -> Result<ConcurrentState<Self::Value>> {
        let wire: WireState = serde_json::from_value(raw.clone())?;

        let intervals = wire
            .slices
            .iter()
            .map(|slice| {
                let interval = Interval::new(
                    self.parse_value(&slice.start)?,
                    self.parse_value(&slice.end)?,
                );
                let most_recent = slice
                    .most_recent_cursor_value
                    .as_ref()
                    .filter(|v| !v.is_null())
                    .map(|v| self.parse_value(v))
                    .transpose()?;
                Ok(interval.with_most_recent(most_recent))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConcurrentState::new(intervals).with_legacy(wire.legacy))
    }

    /// Render interval-format state
    fn serialize(&self, state: &ConcurrentState<Self::Value>) -> JsonValue {
        let wire = WireState {
            state_type: StateType::DateRange,
            slices: state
                .intervals
                .iter()
                .map(|interval| WireInterval {
                    start: self.output_format(&interval.start),
                    end: self.output_format(&interval.end),
                    most_recent_cursor_value: interval
                        .most_recent_cursor_value
                        .as_ref()
                        .map(|v| self.output_format(v)),
                })
                .collect(),
            legacy: state.legacy.clone(),
        };
        serde_json::to_value(wire).unwrap_or(JsonValue::Null)
    }

    /// Migrate state into the interval format
    ///
    /// Returns the low-water-mark of the next sync and the state. A legacy
    /// `{cursor_field: value}` becomes a single bootstrap interval ending at
    /// the legacy value.
    fn convert_from_sequential_state(
        &self,
        cursor_field: &CursorField,
        raw: &JsonValue,
        start: Option<&Self::Value>,
    ) -> Result<(Self::Value, ConcurrentState<Self::Value>)> {
        let sync_start = self.sync_start(cursor_field, raw, start)?;
        if self.is_state_compatible(raw) {
            return Ok((sync_start, self.deserialize(raw)?));
        }

        let bootstrap = Interval::new(
            start.cloned().unwrap_or_else(|| sync_start.clone()),
            sync_start.clone(),
        )
        .with_most_recent(Some(sync_start.clone()));

        let legacy = raw.as_object().filter(|o| !o.is_empty()).cloned();
        let state = ConcurrentState::new(vec![bootstrap]).with_legacy(legacy);
        Ok((sync_start, state))
    }

    /// Low-water-mark derived from a legacy state and the configured start
    fn sync_start(
        &self,
        cursor_field: &CursorField,
        raw: &JsonValue,
        start: Option<&Self::Value>,
    ) -> Result<Self::Value> {
        let sync_start = start.cloned().unwrap_or_else(|| self.zero_value());

        let previous = match raw {
            JsonValue::Null => None,
            JsonValue::Object(object) => object
                .get(cursor_field.key())
                .filter(|v| !v.is_null())
                .map(|v| self.parse_value(v))
                .transpose()?,
            other => {
                return Err(Error::value_parse(other, "stream state must be a JSON object"))
            }
        };

        Ok(match previous {
            Some(previous) if previous >= sync_start => previous,
            _ => sync_start,
        })
    }

    /// Render the checkpoint published for `state`
    fn convert_to_state_message(
        &self,
        cursor_field: &CursorField,
        state: &ConcurrentState<Self::Value>,
    ) -> JsonValue {
        if !self.is_sequential_state() {
            return self.serialize(state);
        }

        let mut legacy: JsonObject = state.legacy.clone().unwrap_or_default();
        let merged = self.merge_intervals(state.intervals.clone());
        if let Some(first) = merged.first() {
            let latest_complete = first
                .most_recent_cursor_value
                .as_ref()
                .unwrap_or(&first.start);
            legacy.insert(
                cursor_field.key().to_string(),
                self.output_format(latest_complete),
            );
        }
        JsonValue::Object(legacy)
    }
}
