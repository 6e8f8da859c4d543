//! Partition types and traits
//!
//! Defines slices, records and the partition contract consumed by cursors.

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A bounded, independently readable unit of work
///
/// `partition` carries non-cursor keys (parent ids, regions, ...) while
/// `cursor_slice` carries the cursor bounds of the unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Partition key values
    #[serde(default)]
    pub partition: BTreeMap<String, JsonValue>,
    /// Cursor boundary values
    #[serde(default)]
    pub cursor_slice: BTreeMap<String, JsonValue>,
}

impl Slice {
    /// Create an empty slice (the top-level stream)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slice with only cursor bounds
    pub fn from_bounds(
        start_field: impl Into<String>,
        start: JsonValue,
        end_field: impl Into<String>,
        end: JsonValue,
    ) -> Self {
        Self::new()
            .with_cursor_value(start_field, start)
            .with_cursor_value(end_field, end)
    }

    /// Add a partition key value
    #[must_use]
    pub fn with_partition_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.partition.insert(key.into(), value.into());
        self
    }

    /// Add a cursor boundary value
    #[must_use]
    pub fn with_cursor_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.cursor_slice.insert(key.into(), value.into());
        self
    }

    /// Look up a key, cursor bounds first then partition values
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.cursor_slice.get(key).or_else(|| self.partition.get(key))
    }

    /// Whether the slice carries no values at all
    pub fn is_empty(&self) -> bool {
        self.partition.is_empty() && self.cursor_slice.is_empty()
    }

    /// Canonical hashable key for this slice
    pub fn key(&self) -> SliceKey {
        // BTreeMap keeps top-level keys ordered, so equal slices render equally
        let rendered = serde_json::to_string(self).unwrap_or_default();
        SliceKey(rendered)
    }
}

/// Hashable identity of a [`Slice`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SliceKey(String);

impl SliceKey {
    /// Key of the top-level (unpartitioned) stream
    pub fn top_level() -> Self {
        Slice::new().key()
    }

    /// Rendered key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record read from a partition
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record payload
    pub data: JsonValue,
    /// Slice the record was read under
    pub slice: Option<Slice>,
}

impl Record {
    /// Create a record that is not tied to a slice
    pub fn new(data: JsonValue) -> Self {
        Self { data, slice: None }
    }

    /// Tag the record with the slice it was read under
    #[must_use]
    pub fn with_slice(mut self, slice: Slice) -> Self {
        self.slice = Some(slice);
        self
    }

    /// Key of the slice this record belongs to
    pub fn slice_key(&self) -> SliceKey {
        self.slice
            .as_ref()
            .map_or_else(SliceKey::top_level, Slice::key)
    }
}

/// Lifecycle of a partition: `Open` until closed, `Closed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStatus {
    /// Being read
    #[default]
    Open,
    /// Fully read and reported to the cursor
    Closed,
}

/// Runtime handle for one slice
#[async_trait]
pub trait Partition: Send + Sync {
    /// Name of the stream this partition belongs to
    fn stream_name(&self) -> &str;

    /// The slice this partition reads, if any
    fn to_slice(&self) -> Option<&Slice>;

    /// Read all records of the partition
    async fn read(&self) -> Result<Vec<Record>>;
}

/// Builds a partition for each slice produced by a cursor
pub trait PartitionGenerator: Send + Sync {
    /// Create the partition reading `slice`
    fn generate(&self, slice: Slice) -> Arc<dyn Partition>;
}
