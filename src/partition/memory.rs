//! In-memory partition implementations
//!
//! Used by tests and by connectors that can fetch a slice's records through
//! a plain closure.

use super::types::{Partition, PartitionGenerator, Record, Slice};
use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;
use std::sync::Arc;

// ============================================================================
// Static Partition
// ============================================================================

/// Partition over a fixed list of records
#[derive(Debug, Clone)]
pub struct StaticPartition {
    /// Stream name
    stream: String,
    /// Slice the records belong to
    slice: Option<Slice>,
    /// Buffered record payloads
    records: Vec<JsonValue>,
}

impl StaticPartition {
    /// Create a partition for `slice` holding `records`
    pub fn new(stream: impl Into<String>, slice: Option<Slice>, records: Vec<JsonValue>) -> Self {
        Self {
            stream: stream.into(),
            slice,
            records,
        }
    }

    /// Create a top-level partition without slice
    pub fn unsliced(stream: impl Into<String>, records: Vec<JsonValue>) -> Self {
        Self::new(stream, None, records)
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the partition holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Partition for StaticPartition {
    fn stream_name(&self) -> &str {
        &self.stream
    }

    fn to_slice(&self) -> Option<&Slice> {
        self.slice.as_ref()
    }

    async fn read(&self) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .map(|data| {
                let record = Record::new(data.clone());
                match &self.slice {
                    Some(slice) => record.with_slice(slice.clone()),
                    None => record,
                }
            })
            .collect())
    }
}

// ============================================================================
// Closure-backed Partition
// ============================================================================

/// Partition that fetches its records through a closure when read
pub struct FnPartition<F> {
    stream: String,
    slice: Slice,
    fetch: Arc<F>,
}

impl<F> FnPartition<F>
where
    F: Fn(&Slice) -> Vec<JsonValue> + Send + Sync,
{
    /// Create a partition reading `slice` through `fetch`
    pub fn new(stream: impl Into<String>, slice: Slice, fetch: Arc<F>) -> Self {
        Self {
            stream: stream.into(),
            slice,
            fetch,
        }
    }
}

#[async_trait]
impl<F> Partition for FnPartition<F>
where
    F: Fn(&Slice) -> Vec<JsonValue> + Send + Sync,
{
    fn stream_name(&self) -> &str {
        &self.stream
    }

    fn to_slice(&self) -> Option<&Slice> {
        Some(&self.slice)
    }

    async fn read(&self) -> Result<Vec<Record>> {
        Ok((self.fetch)(&self.slice)
            .into_iter()
            .map(|data| Record::new(data).with_slice(self.slice.clone()))
            .collect())
    }
}

// ============================================================================
// Closure-backed Generator
// ============================================================================

/// Generator of [`FnPartition`]s sharing one fetch closure
///
/// Generating a partition is cheap; the closure only runs once the
/// partition is read.
pub struct FnPartitionGenerator<F> {
    stream: String,
    fetch: Arc<F>,
}

impl<F> FnPartitionGenerator<F>
where
    F: Fn(&Slice) -> Vec<JsonValue> + Send + Sync,
{
    /// Create a generator for `stream`
    pub fn new(stream: impl Into<String>, fetch: F) -> Self {
        Self {
            stream: stream.into(),
            fetch: Arc::new(fetch),
        }
    }
}

impl<F> PartitionGenerator for FnPartitionGenerator<F>
where
    F: Fn(&Slice) -> Vec<JsonValue> + Send + Sync + 'static,
{
    fn generate(&self, slice: Slice) -> Arc<dyn Partition> {
        Arc::new(FnPartition::new(
            self.stream.clone(),
            slice,
            Arc::clone(&self.fetch),
        ))
    }
}
