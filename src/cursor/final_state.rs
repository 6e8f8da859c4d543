//! Cursor for streams without incremental state

use super::Cursor;
use crate::engine::{Message, MessageSink};
use crate::error::Result;
use crate::partition::{Partition, Record};
use crate::types::{JsonValue, StreamDescriptor};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Key of the sentinel checkpoint emitted for full refresh streams
pub const NO_CURSOR_STATE_KEY: &str = "__ab_no_cursor_state_message";

/// Guarantees one checkpoint for streams that track no cursor
pub struct FinalStateCursor {
    stream: StreamDescriptor,
    sink: Arc<dyn MessageSink>,
}

impl FinalStateCursor {
    /// Create a cursor publishing into `sink`
    pub fn new(stream: StreamDescriptor, sink: Arc<dyn MessageSink>) -> Self {
        Self { stream, sink }
    }
}

impl Cursor for FinalStateCursor {
    fn stream(&self) -> &StreamDescriptor {
        &self.stream
    }

    fn state(&self) -> JsonValue {
        serde_json::json!({ NO_CURSOR_STATE_KEY: true })
    }

    fn observe(&self, _record: &Record) {}

    fn close_partition(&self, _partition: &dyn Partition) -> Result<()> {
        Ok(())
    }

    fn ensure_at_least_one_state_emitted(&self) {
        debug!(stream = %self.stream, "Emitting final state");
        self.sink
            .publish(Message::state(self.stream.clone(), self.state()));
    }

    fn should_be_synced(&self, _record: &Record) -> bool {
        true
    }
}

impl fmt::Debug for FinalStateCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalStateCursor")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}
