//! Cursor values
//!
//! A cursor value is an opaque, totally ordered point of the synced domain
//! that can be moved by a gap (a duration for timestamps).

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// An orderable progress value
///
/// Arithmetic is checked: `None` signals that the result falls outside the
/// representable range and callers decide how to saturate.
pub trait CursorValue: Clone + Ord + fmt::Debug + Send + Sync + 'static {
    /// Distance between two values (step, lookback, granularity)
    type Gap: Clone + fmt::Debug + Send + Sync + 'static;

    /// `self + gap`, or `None` on overflow
    fn checked_add_gap(&self, gap: &Self::Gap) -> Option<Self>;

    /// `self - gap`, or `None` on overflow
    fn checked_sub_gap(&self, gap: &Self::Gap) -> Option<Self>;
}

impl CursorValue for DateTime<Utc> {
    type Gap = Duration;

    fn checked_add_gap(&self, gap: &Duration) -> Option<Self> {
        self.checked_add_signed(*gap)
    }

    fn checked_sub_gap(&self, gap: &Duration) -> Option<Self> {
        self.checked_sub_signed(*gap)
    }
}

/// Supplies the upper bound of a sync, usually "now"
pub type EndProvider<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// End provider returning the current UTC time
pub fn now_end_provider() -> EndProvider<DateTime<Utc>> {
    Arc::new(Utc::now)
}

/// End provider returning a fixed value
pub fn fixed_end_provider<V: CursorValue>(value: V) -> EndProvider<V> {
    Arc::new(move || value.clone())
}
