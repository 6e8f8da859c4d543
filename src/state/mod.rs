//! State management module
//!
//! Cursor values, the interval state they build, the converters between
//! in-memory and wire formats, and checkpoint persistence.
//!
//! # Overview
//!
//! The state module provides:
//! - `CursorValue` - Ordered progress values (timestamps)
//! - `ConcurrentState` - Merged set of fully synced intervals
//! - `StateConverter` - Parsing, formatting and merging per wire format
//! - `StateManager` - File-based checkpoint persistence

mod converter;
mod datetime;
mod manager;
mod types;
mod value;

pub use converter::StateConverter;
pub use datetime::{
    parse_datetime, CustomFormatConverter, EpochValueConverter, IsoMillisConverter,
    ISO_MILLIS_FORMAT,
};
pub use manager::StateManager;
pub use types::{
    ConcurrentState, Interval, State, StateType, WireInterval, WireState, STATE_TYPE_KEY,
};
pub use value::{fixed_end_provider, now_end_provider, CursorValue, EndProvider};

#[cfg(test)]
mod tests;
