//! State types for tracking sync progress
//!
//! `ConcurrentState` is the in-memory interval set; `WireState` is its
//! serialized form, persisted between runs.

use super::value::CursorValue;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key holding the state type discriminator
pub const STATE_TYPE_KEY: &str = "state_type";

/// Discriminator of the interval state format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateType {
    /// Intervals over an ordered domain
    #[default]
    #[serde(rename = "date-range")]
    DateRange,
}

impl StateType {
    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            StateType::DateRange => "date-range",
        }
    }
}

/// A contiguous, fully synced span `[start, end]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval<V> {
    /// Inclusive lower bound
    pub start: V,
    /// Inclusive upper bound
    pub end: V,
    /// Highest cursor value observed while syncing the span
    pub most_recent_cursor_value: Option<V>,
}

impl<V: CursorValue> Interval<V> {
    /// Create an interval without observed value
    pub fn new(start: V, end: V) -> Self {
        Self {
            start,
            end,
            most_recent_cursor_value: None,
        }
    }

    /// Set the most recent observed value
    #[must_use]
    pub fn with_most_recent(mut self, value: Option<V>) -> Self {
        self.most_recent_cursor_value = value;
        self
    }

    /// Whether `value` lies within the interval
    pub fn contains(&self, value: &V) -> bool {
        &self.start <= value && value <= &self.end
    }
}

/// In-memory interval set of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrentState<V> {
    /// Synced intervals, sorted by start and non-overlapping once merged
    pub intervals: Vec<Interval<V>>,
    /// Pre-migration state, kept for diagnostics and legacy output
    pub legacy: Option<JsonObject>,
}

impl<V> Default for ConcurrentState<V> {
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
            legacy: None,
        }
    }
}

impl<V: CursorValue> ConcurrentState<V> {
    /// Create a state from intervals
    pub fn new(intervals: Vec<Interval<V>>) -> Self {
        Self {
            intervals,
            legacy: None,
        }
    }

    /// Attach the legacy state
    #[must_use]
    pub fn with_legacy(mut self, legacy: Option<JsonObject>) -> Self {
        self.legacy = legacy;
        self
    }

    /// Whether any interval covers `value`
    pub fn covers(&self, value: &V) -> bool {
        self.intervals.iter().any(|i| i.contains(value))
    }
}

/// Serialized interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireInterval {
    pub start: JsonValue,
    pub end: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_recent_cursor_value: Option<JsonValue>,
}

/// Serialized concurrent state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireState {
    pub state_type: StateType,
    #[serde(default)]
    pub slices: Vec<WireInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<JsonObject>,
}

// ============================================================================
// Persisted State
// ============================================================================

/// Latest checkpoint of every stream, as persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Checkpoints keyed by stream (`namespace.name` or `name`)
    #[serde(default)]
    pub streams: BTreeMap<String, JsonValue>,
}

impl State {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the checkpoint of a stream
    pub fn get_stream(&self, stream: &str) -> Option<&JsonValue> {
        self.streams.get(stream)
    }

    /// Replace the checkpoint of a stream
    pub fn set_stream(&mut self, stream: impl Into<String>, data: JsonValue) {
        self.streams.insert(stream.into(), data);
    }

    /// Number of streams with a checkpoint
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream has a checkpoint
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
