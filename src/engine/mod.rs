//! Execution engine module
//!
//! Concurrent read loop of one stream.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ConcurrentReader` - Reads the partitions of a stream on a bounded worker pool
//! - `SyncConfig` - Configuration for sync operations
//! - Message types and sinks for output (Record, State, Log)
//!
//! The reader asks the cursor for slices, turns every slice into a partition,
//! reads partitions concurrently and reports each one back to the cursor once
//! all of its records were observed.

mod sink;
mod types;

pub use sink::{ChannelSink, MemorySink, MessageSink, NoopSink, WriterSink};
pub use types::{Message, SyncConfig, SyncStats};

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::partition::{Partition, PartitionGenerator, PartitionStatus};
use crate::types::StreamDescriptor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

// ============================================================================
// Partition Run
// ============================================================================

/// A partition together with its lifecycle status
pub struct PartitionRun {
    partition: Arc<dyn Partition>,
    status: PartitionStatus,
}

impl PartitionRun {
    /// Start tracking an open partition
    pub fn new(partition: Arc<dyn Partition>) -> Self {
        Self {
            partition,
            status: PartitionStatus::Open,
        }
    }

    /// The partition being read
    pub fn partition(&self) -> &Arc<dyn Partition> {
        &self.partition
    }

    /// Current status
    pub fn status(&self) -> PartitionStatus {
        self.status
    }

    /// Report the partition as fully read to `cursor`
    ///
    /// A partition is closed at most once.
    pub fn close(&mut self, cursor: &dyn Cursor) -> Result<()> {
        if self.status == PartitionStatus::Closed {
            return Err(Error::partition(
                self.partition.stream_name(),
                "partition was already closed",
            ));
        }
        cursor.close_partition(self.partition.as_ref())?;
        self.status = PartitionStatus::Closed;
        Ok(())
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Everything a worker task needs to read one partition
#[derive(Clone)]
struct PartitionWorker {
    stream: StreamDescriptor,
    cursor: Arc<dyn Cursor>,
    sink: Arc<dyn MessageSink>,
    emit_records: bool,
    max_records: usize,
    emitted: Arc<AtomicUsize>,
}

impl PartitionWorker {
    /// Whether another record may still be published
    fn claim_record_slot(&self) -> bool {
        self.max_records == 0 || self.emitted.fetch_add(1, Ordering::Relaxed) < self.max_records
    }

    async fn run(self, partition: Arc<dyn Partition>) -> Result<SyncStats> {
        let mut stats = SyncStats::new();
        let mut run = PartitionRun::new(partition);

        let records = run
            .partition()
            .read()
            .await
            .map_err(|e| Error::partition(self.stream.to_string(), e.to_string()))?;

        for record in records {
            stats.records_read += 1;
            if !self.cursor.should_be_synced(&record) {
                stats.records_filtered += 1;
                continue;
            }
            self.cursor.observe(&record);
            stats.records_synced += 1;

            if self.emit_records && self.claim_record_slot() {
                self.sink
                    .publish(Message::record(self.stream.clone(), record.data));
            }
        }

        run.close(self.cursor.as_ref())?;
        stats.add_partition();
        debug!(
            stream = %self.stream,
            records = stats.records_synced,
            "Partition closed"
        );
        Ok(stats)
    }
}

// ============================================================================
// Concurrent Reader
// ============================================================================

/// Reads the partitions of a stream concurrently
pub struct ConcurrentReader {
    /// Destination of records and log messages
    sink: Arc<dyn MessageSink>,
    /// Sync configuration
    config: SyncConfig,
}

impl ConcurrentReader {
    /// Create a reader publishing into `sink`
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            config: SyncConfig::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Read every slice the cursor yields
    ///
    /// At most `max_workers` partitions are read at a time. With `fail_fast`
    /// the first failing partition aborts the others and its error is
    /// returned; otherwise failures are counted and the sync completes with
    /// a final checkpoint.
    pub async fn read(
        &self,
        cursor: Arc<dyn Cursor>,
        generator: Arc<dyn PartitionGenerator>,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let stream = cursor.stream().clone();
        let slices = cursor.stream_slices();

        info!(
            stream = %stream,
            slices = slices.len(),
            workers = self.config.max_workers,
            "Starting concurrent read"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let worker = PartitionWorker {
            stream: stream.clone(),
            cursor: Arc::clone(&cursor),
            sink: Arc::clone(&self.sink),
            emit_records: self.config.emit_records,
            max_records: self.config.max_records,
            emitted: Arc::new(AtomicUsize::new(0)),
        };

        let mut workers = JoinSet::new();
        for slice in slices {
            let partition = generator.generate(slice);
            let worker = worker.clone();
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::partition(worker.stream.to_string(), e.to_string()))?;
                worker.run(partition).await
            });
        }

        let mut stats = SyncStats::new();
        while let Some(joined) = workers.join_next().await {
            let outcome = joined
                .map_err(|e| Error::partition(stream.to_string(), format!("worker failed: {e}")))
                .and_then(|result| result);

            match outcome {
                Ok(partition_stats) => stats.merge(&partition_stats),
                Err(e) => {
                    stats.add_error();
                    warn!(stream = %stream, "Partition failed: {e}");
                    self.sink
                        .publish(Message::warn(format!("Partition failed for {stream}: {e}")));

                    if self.config.fail_fast {
                        workers.shutdown().await;
                        return Err(e);
                    }
                }
            }
        }

        cursor.ensure_at_least_one_state_emitted();

        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            stream = %stream,
            partitions = stats.partitions_synced,
            records = stats.records_synced,
            errors = stats.errors,
            "Completed concurrent read in {}ms",
            stats.duration_ms
        );
        Ok(stats)
    }
}
