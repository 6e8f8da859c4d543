//! Engine types
//!
//! Message types and configuration for the concurrent reader.

use crate::types::{JsonValue, LogLevel, StreamDescriptor};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A record read from a partition
    Record {
        /// Stream the record belongs to
        stream: StreamDescriptor,
        /// The record data
        data: JsonValue,
    },
    /// Checkpoint of a stream
    State {
        /// Stream the checkpoint belongs to
        stream: StreamDescriptor,
        /// Serialized cursor state
        data: JsonValue,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: StreamDescriptor, data: JsonValue) -> Self {
        Self::Record { stream, data }
    }

    /// Create a state message
    pub fn state(stream: StreamDescriptor, data: JsonValue) -> Self {
        Self::State { stream, data }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of partitions read concurrently
    pub max_workers: usize,
    /// Maximum records to emit per stream (0 = unlimited)
    pub max_records: usize,
    /// Whether to abort the stream on the first partition error
    pub fail_fast: bool,
    /// Whether records are published to the sink
    pub emit_records: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_records: 0,
            fail_fast: true,
            emit_records: true,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size (at least one)
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Publish records or only checkpoints
    #[must_use]
    pub fn with_emit_records(mut self, emit: bool) -> Self {
        self.emit_records = emit;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records read from partitions
    pub records_read: usize,
    /// Records within the sync range and emitted
    pub records_synced: usize,
    /// Records dropped as outside the sync range
    pub records_filtered: usize,
    /// Partitions read and closed
    pub partitions_synced: usize,
    /// Partitions that failed
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the stats of one partition into the total
    pub fn merge(&mut self, other: &SyncStats) {
        self.records_read += other.records_read;
        self.records_synced += other.records_synced;
        self.records_filtered += other.records_filtered;
        self.partitions_synced += other.partitions_synced;
        self.errors += other.errors;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
