//! Cursor module
//!
//! Cursors track incremental sync progress for one stream.
//!
//! # Overview
//!
//! The cursor module provides:
//! - `Cursor` - The contract the reader drives (observe, close, checkpoint)
//! - `ConcurrentCursor` - Interval tracking for partitions completing in any order
//! - `FinalStateCursor` - Sentinel checkpoint for full refresh streams
//! - `CursorFactory` - Builds cursors from `IncrementalConfig`

mod concurrent;
mod factory;
mod field;
mod final_state;

pub use concurrent::{ConcurrentCursor, ConcurrentCursorBuilder};
pub use factory::CursorFactory;
pub use field::CursorField;
pub use final_state::{FinalStateCursor, NO_CURSOR_STATE_KEY};

use crate::error::Result;
use crate::partition::{Partition, Record, Slice};
use crate::types::{JsonValue, StreamDescriptor};

/// Slice key of the lower bound when no boundary fields are configured
pub const DEFAULT_START_KEY: &str = "start";

/// Slice key of the upper bound when no boundary fields are configured
pub const DEFAULT_END_KEY: &str = "end";

/// Progress tracker of one stream
///
/// All methods take `&self`: a cursor is shared by every worker reading a
/// partition of its stream.
pub trait Cursor: Send + Sync {
    /// Stream the cursor tracks
    fn stream(&self) -> &StreamDescriptor;

    /// Current checkpoint
    fn state(&self) -> JsonValue;

    /// Indicate that a record has been read
    fn observe(&self, record: &Record);

    /// Indicate that a partition has been fully read
    fn close_partition(&self, partition: &dyn Partition) -> Result<()>;

    /// Publish the current checkpoint; called once at the end of a sync
    fn ensure_at_least_one_state_emitted(&self);

    /// Whether a record falls within the sync range
    fn should_be_synced(&self, record: &Record) -> bool;

    /// Slices to read in this sync
    fn stream_slices(&self) -> Vec<Slice> {
        vec![Slice::new()]
    }

    /// Narrow a slice to the part not read yet
    fn reduce_slice_range(&self, slice: &Slice) -> Slice {
        slice.clone()
    }
}

#[cfg(test)]
mod tests;
