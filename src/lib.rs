// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Cursor
//!
//! Concurrency-safe incremental sync cursors.
//!
//! A cursor remembers which parts of a stream's cursor domain were fully
//! synced, even when partitions complete out of order, and turns the gaps
//! into the slices of the next sync.
//!
//! ## Features
//!
//! - **Interval State**: Checkpoints are merged ranges, resumable after any crash
//! - **Legacy Migration**: Single-value `{cursor_field: value}` state is bootstrapped
//! - **Slice Generation**: Step, lookback window, granularity and calendar clamping
//! - **Concurrent Reads**: Partitions are read on a bounded tokio worker pool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_cursor::config::IncrementalConfig;
//! use solidafy_cursor::cursor::CursorFactory;
//! use solidafy_cursor::engine::{ConcurrentReader, WriterSink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> solidafy_cursor::Result<()> {
//!     let config = IncrementalConfig::from_file("cursor.yaml")?;
//!     let sink = Arc::new(WriterSink::stdout());
//!
//!     let cursor = CursorFactory::new().create_cursor(&config, &serde_json::Value::Null, sink.clone())?;
//!     let stats = ConcurrentReader::new(sink).read(cursor, generator).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 ConcurrentReader (engine)                    │
//! │  stream_slices() → partitions → workers → close_partition()  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴───┬──────────────┬────────────┐
//! │   Cursor   │  StateConverter    │  Clamping    │   Sink     │
//! ├────────────┼────────────────────┼──────────────┼────────────┤
//! │ Concurrent │ Epoch              │ Day          │ Channel    │
//! │ FinalState │ ISO millis         │ Week         │ Memory     │
//! │ Factory    │ Custom strftime    │ Month        │ Writer     │
//! └────────────┴────────────────────┴──────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration of incremental streams
pub mod config;

/// Slices, records and partitions
pub mod partition;

/// Cursor values, state converters and state persistence
pub mod state;

/// Slice boundary clamping
pub mod clamping;

/// Concurrent and final-state cursors
pub mod cursor;

/// Concurrent read loop and message sinks
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::IncrementalConfig;
pub use cursor::{ConcurrentCursor, Cursor, CursorFactory, FinalStateCursor};
pub use engine::{ConcurrentReader, Message, MessageSink};
pub use state::{StateConverter, StateManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
