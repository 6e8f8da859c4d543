//! Datetime state converters
//!
//! Three wire formats over `DateTime<Utc>`: epoch seconds, ISO 8601 with
//! milliseconds, and an arbitrary strftime format.

use super::converter::StateConverter;
use super::value::CursorValue;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Output format of [`IsoMillisConverter`]
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn default_granularity() -> Duration {
    Duration::milliseconds(1)
}

fn step(value: &DateTime<Utc>, gap: Duration) -> DateTime<Utc> {
    value.checked_add_gap(&gap).unwrap_or(*value)
}

// ============================================================================
// Epoch Seconds
// ============================================================================

/// Cursor values stored as integer seconds since the Unix epoch
#[derive(Debug, Clone, Default)]
pub struct EpochValueConverter {
    is_sequential_state: bool,
}

impl EpochValueConverter {
    /// Create a converter emitting interval state
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit checkpoints in the legacy single-value format
    #[must_use]
    pub fn with_sequential_state(mut self, sequential: bool) -> Self {
        self.is_sequential_state = sequential;
        self
    }
}

impl StateConverter for EpochValueConverter {
    type Value = DateTime<Utc>;

    fn parse_value(&self, raw: &JsonValue) -> Result<DateTime<Utc>> {
        let seconds = match raw {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64)),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| Error::value_parse(raw, "expected epoch seconds"))?;

        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| Error::value_parse(raw, "timestamp out of range"))
    }

    fn output_format(&self, value: &DateTime<Utc>) -> JsonValue {
        JsonValue::from(value.timestamp())
    }

    fn zero_value(&self) -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    fn increment(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        step(value, Duration::seconds(1))
    }

    fn is_sequential_state(&self) -> bool {
        self.is_sequential_state
    }
}

// ============================================================================
// ISO 8601 with milliseconds
// ============================================================================

/// Cursor values stored as `YYYY-MM-DDTHH:MM:SS.mmmZ`
#[derive(Debug, Clone, Default)]
pub struct IsoMillisConverter {
    is_sequential_state: bool,
    cursor_granularity: Option<Duration>,
}

impl IsoMillisConverter {
    /// Create a converter emitting interval state
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit checkpoints in the legacy single-value format
    #[must_use]
    pub fn with_sequential_state(mut self, sequential: bool) -> Self {
        self.is_sequential_state = sequential;
        self
    }

    /// Step used to decide whether two intervals are adjacent
    #[must_use]
    pub fn with_cursor_granularity(mut self, granularity: Option<Duration>) -> Self {
        self.cursor_granularity = granularity;
        self
    }
}

impl StateConverter for IsoMillisConverter {
    type Value = DateTime<Utc>;

    fn parse_value(&self, raw: &JsonValue) -> Result<DateTime<Utc>> {
        match raw {
            JsonValue::String(s) => parse_datetime(s),
            other => Err(Error::value_parse(other, "expected an ISO 8601 string")),
        }
    }

    fn output_format(&self, value: &DateTime<Utc>) -> JsonValue {
        JsonValue::String(value.format(ISO_MILLIS_FORMAT).to_string())
    }

    fn zero_value(&self) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(DateTime::<Utc>::MIN_UTC, |ndt| {
                DateTime::from_naive_utc_and_offset(ndt, Utc)
            })
    }

    fn increment(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        step(value, self.cursor_granularity.unwrap_or_else(default_granularity))
    }

    fn is_sequential_state(&self) -> bool {
        self.is_sequential_state
    }
}

// ============================================================================
// Custom strftime format
// ============================================================================

/// Cursor values stored in a caller-defined strftime format
#[derive(Debug, Clone)]
pub struct CustomFormatConverter {
    datetime_format: String,
    input_datetime_formats: Vec<String>,
    is_sequential_state: bool,
    cursor_granularity: Option<Duration>,
}

impl CustomFormatConverter {
    /// Create a converter rendering values with `datetime_format`
    pub fn new(datetime_format: impl Into<String>) -> Result<Self> {
        let datetime_format = datetime_format.into();
        validate_format(&datetime_format)?;

        Ok(Self {
            datetime_format,
            input_datetime_formats: Vec::new(),
            is_sequential_state: false,
            cursor_granularity: None,
        })
    }

    /// Additional formats accepted when parsing, tried before the output format
    pub fn with_input_formats(mut self, formats: Vec<String>) -> Result<Self> {
        for format in &formats {
            validate_format(format)?;
        }
        self.input_datetime_formats = formats;
        Ok(self)
    }

    /// Emit checkpoints in the legacy single-value format
    #[must_use]
    pub fn with_sequential_state(mut self, sequential: bool) -> Self {
        self.is_sequential_state = sequential;
        self
    }

    /// Step used to decide whether two intervals are adjacent
    #[must_use]
    pub fn with_cursor_granularity(mut self, granularity: Option<Duration>) -> Self {
        self.cursor_granularity = granularity;
        self
    }

    /// The output format
    pub fn datetime_format(&self) -> &str {
        &self.datetime_format
    }
}

impl StateConverter for CustomFormatConverter {
    type Value = DateTime<Utc>;

    fn parse_value(&self, raw: &JsonValue) -> Result<DateTime<Utc>> {
        let text = match raw {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            other => return Err(Error::value_parse(other, "expected a datetime string")),
        };

        self.input_datetime_formats
            .iter()
            .chain(std::iter::once(&self.datetime_format))
            .find_map(|format| parse_with_format(&text, format))
            .ok_or_else(|| {
                Error::value_parse(
                    raw,
                    format!("does not match format '{}'", self.datetime_format),
                )
            })
    }

    fn output_format(&self, value: &DateTime<Utc>) -> JsonValue {
        JsonValue::String(value.format(&self.datetime_format).to_string())
    }

    fn zero_value(&self) -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    fn increment(&self, value: &DateTime<Utc>) -> DateTime<Utc> {
        step(value, self.cursor_granularity.unwrap_or_else(default_granularity))
    }

    fn is_sequential_state(&self) -> bool {
        self.is_sequential_state
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Reject strftime strings chrono cannot render
fn validate_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::invalid_value(
            "datetime_format",
            format!("invalid strftime format: {format}"),
        ));
    }
    Ok(())
}

/// Parse `s` with one strftime format, timezone-aware first
fn parse_with_format(s: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(s, format) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
        return Some(DateTime::from_naive_utc_and_offset(ndt, Utc));
    }
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|nd| nd.and_hms_opt(0, 0, 0))
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Parse a datetime string into UTC DateTime
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC 3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d",
        "%Y/%m/%d",
    ];

    formats
        .iter()
        .find_map(|format| parse_with_format(s, format))
        .ok_or_else(|| Error::value_parse(s, "invalid datetime format"))
}
