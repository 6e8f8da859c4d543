//! Message sinks
//!
//! Cursors and the reader publish through a [`MessageSink`]. Publishing is
//! fire-and-forget: a sink never blocks the caller on a slow consumer and
//! never fails.

use super::types::Message;
use crate::types::JsonValue;
use parking_lot::Mutex;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::debug;

/// Destination of records, checkpoints and log messages
pub trait MessageSink: Send + Sync {
    /// Publish a message
    fn publish(&self, message: Message);
}

// ============================================================================
// Channel Sink
// ============================================================================

/// Forwards messages into an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MessageSink for ChannelSink {
    fn publish(&self, message: Message) {
        if let Err(e) = self.sender.send(message) {
            debug!("Message dropped, receiver closed: {:?}", e.0);
        }
    }
}

// ============================================================================
// Memory Sink
// ============================================================================

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Checkpoint payloads published so far, in order
    pub fn states(&self) -> Vec<JsonValue> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| match message {
                Message::State { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Record payloads published so far, in order
    pub fn records(&self) -> Vec<JsonValue> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| match message {
                Message::Record { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent checkpoint
    pub fn last_state(&self) -> Option<JsonValue> {
        self.states().pop()
    }

    /// Number of messages published so far
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing was published
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MessageSink for MemorySink {
    fn publish(&self, message: Message) {
        self.messages.lock().push(message);
    }
}

// ============================================================================
// Writer Sink
// ============================================================================

/// Writes checkpoints and records as JSON lines
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<std::io::Stdout> {
    /// Write to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> MessageSink for WriterSink<W> {
    fn publish(&self, message: Message) {
        let line = match &message {
            Message::Record { stream, data } => serde_json::json!({
                "type": "RECORD",
                "stream": stream,
                "data": data,
            }),
            Message::State { stream, data } => serde_json::json!({
                "type": "STATE",
                "stream": stream,
                "data": data,
            }),
            Message::Log { level, message } => serde_json::json!({
                "type": "LOG",
                "level": level,
                "message": message,
            }),
        };

        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}") {
            debug!("Failed to write message: {e}");
        }
    }
}

// ============================================================================
// Noop Sink
// ============================================================================

/// Discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MessageSink for NoopSink {
    fn publish(&self, _message: Message) {}
}
