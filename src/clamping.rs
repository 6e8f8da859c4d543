//! Slice boundary clamping
//!
//! Aligns slice boundaries to a calendar grid so that slices cover whole
//! days, weeks or months. Floor mode truncates to the start of the period;
//! ceiling mode moves to the start of the following period unless the value
//! already sits on a period start.

use crate::state::{CursorValue, EndProvider};
use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc, Weekday};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Rounds a cursor value onto a grid
pub trait ClampingStrategy<V>: fmt::Debug + Send + Sync {
    /// Clamp a value
    fn clamp(&self, value: &V) -> V;
}

// ============================================================================
// No Clamping
// ============================================================================

/// Identity strategy
pub struct NoClamping<V>(PhantomData<fn() -> V>);

impl<V> NoClamping<V> {
    /// Create the identity strategy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for NoClamping<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for NoClamping<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoClamping")
    }
}

impl<V: Clone> ClampingStrategy<V> for NoClamping<V> {
    fn clamp(&self, value: &V) -> V {
        value.clone()
    }
}

// ============================================================================
// Calendar Strategies
// ============================================================================

fn midnight(value: &DateTime<Utc>) -> DateTime<Utc> {
    value
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn ceil_by(value: &DateTime<Utc>, floor: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    if *value == floor {
        return floor;
    }
    floor.checked_add_signed(period).unwrap_or(floor)
}

/// Clamp to day boundaries
#[derive(Debug, Clone, Copy)]
pub struct DayClampingStrategy {
    is_ceiling: bool,
}

impl DayClampingStrategy {
    /// Round up to midnight
    pub fn ceiling() -> Self {
        Self { is_ceiling: true }
    }

    /// Truncate to midnight
    pub fn floor() -> Self {
        Self { is_ceiling: false }
    }
}

impl Default for DayClampingStrategy {
    fn default() -> Self {
        Self::ceiling()
    }
}

impl ClampingStrategy<DateTime<Utc>> for DayClampingStrategy {
    fn clamp(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        let floor = midnight(value);
        if self.is_ceiling {
            ceil_by(value, floor, Duration::days(1))
        } else {
            floor
        }
    }
}

/// Clamp to week boundaries starting on a given weekday
#[derive(Debug, Clone, Copy)]
pub struct WeekClampingStrategy {
    weekday: Weekday,
    is_ceiling: bool,
}

impl WeekClampingStrategy {
    /// Round up to the start of a week
    pub fn ceiling(weekday: Weekday) -> Self {
        Self {
            weekday,
            is_ceiling: true,
        }
    }

    /// Truncate to the start of the week
    pub fn floor(weekday: Weekday) -> Self {
        Self {
            weekday,
            is_ceiling: false,
        }
    }

    /// The weekday weeks start on
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }
}

impl ClampingStrategy<DateTime<Utc>> for WeekClampingStrategy {
    fn clamp(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        let since_start = (7 + value.weekday().num_days_from_monday()
            - self.weekday.num_days_from_monday())
            % 7;
        let floor = midnight(value)
            .checked_sub_signed(Duration::days(i64::from(since_start)))
            .unwrap_or_else(|| midnight(value));

        if self.is_ceiling {
            ceil_by(value, floor, Duration::days(7))
        } else {
            floor
        }
    }
}

/// Clamp to the first day of the month
#[derive(Debug, Clone, Copy)]
pub struct MonthClampingStrategy {
    is_ceiling: bool,
}

impl MonthClampingStrategy {
    /// Round up to the first day of a month
    pub fn ceiling() -> Self {
        Self { is_ceiling: true }
    }

    /// Truncate to the first day of the month
    pub fn floor() -> Self {
        Self { is_ceiling: false }
    }
}

impl Default for MonthClampingStrategy {
    fn default() -> Self {
        Self::ceiling()
    }
}

impl ClampingStrategy<DateTime<Utc>> for MonthClampingStrategy {
    fn clamp(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        let day = midnight(value);
        let floor = day.with_day(1).unwrap_or(day);

        if self.is_ceiling && *value != floor {
            floor.checked_add_months(Months::new(1)).unwrap_or(floor)
        } else {
            floor
        }
    }
}

// ============================================================================
// End Provider
// ============================================================================

/// Wrap an end provider so the sync stops just before the current period
///
/// The returned provider yields `clamp(end()) - granularity`.
pub fn clamped_end_provider<V: CursorValue>(
    strategy: Arc<dyn ClampingStrategy<V>>,
    end: EndProvider<V>,
    granularity: V::Gap,
) -> EndProvider<V> {
    Arc::new(move || {
        let clamped = strategy.clamp(&end());
        clamped.checked_sub_gap(&granularity).unwrap_or(clamped)
    })
}
