//! Configuration types for incremental cursors
//!
//! A cursor is described in YAML (or JSON) and turned into a
//! [`ConcurrentCursor`](crate::cursor::ConcurrentCursor) by the
//! [`CursorFactory`](crate::cursor::CursorFactory).

use crate::error::{Error, Result};
use crate::types::{CursorFormat, StreamDescriptor, SyncMode};
use chrono::{Duration, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// ISO 8601 duration: `P[nY][nM][nW][nD][T[nH][nM][n[.f]S]]`
static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .unwrap()
});

// ============================================================================
// Incremental Config
// ============================================================================

/// Incremental sync configuration of one stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalConfig {
    /// Stream name
    pub name: String,

    /// Optional stream namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// Full refresh streams only emit a sentinel checkpoint
    #[serde(default = "default_sync_mode")]
    pub sync_mode: SyncMode,

    /// Field to use as cursor (dots address nested fields)
    pub cursor_field: String,

    /// Format for cursor values
    #[serde(default)]
    pub cursor_format: CursorFormat,

    /// strftime format, required for the `custom` cursor format
    #[serde(default)]
    pub datetime_format: Option<String>,

    /// Extra formats accepted when parsing `custom` values
    #[serde(default)]
    pub input_datetime_formats: Vec<String>,

    /// Explicit sync start
    #[serde(default)]
    pub start: Option<String>,

    /// Fixed sync end (defaults to now)
    #[serde(default)]
    pub end: Option<String>,

    /// Maximum span of one slice (e.g. "P1D", "1d")
    #[serde(default)]
    pub step: Option<String>,

    /// Smallest step of the cursor (e.g. "PT1S")
    #[serde(default)]
    pub cursor_granularity: Option<String>,

    /// Margin re-read before the last synced value
    #[serde(default)]
    pub lookback_window: Option<String>,

    /// Slice keys carrying the bounds of each partition
    #[serde(default)]
    pub slice_boundary_fields: Option<SliceBoundaryFields>,

    /// Slice boundary clamping
    #[serde(default)]
    pub clamping: Option<ClampingConfig>,

    /// Emit checkpoints as `{cursor_field: value}` instead of intervals
    #[serde(default)]
    pub legacy_state_output: bool,
}

fn default_sync_mode() -> SyncMode {
    SyncMode::Incremental
}

/// Slice keys holding partition bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBoundaryFields {
    /// Key of the lower bound
    pub start_field: String,
    /// Key of the upper bound
    pub end_field: String,
}

// ============================================================================
// Clamping Config
// ============================================================================

/// Calendar grid slice boundaries are aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampingTarget {
    #[serde(alias = "DAY")]
    Day,
    #[serde(alias = "WEEK")]
    Week,
    #[serde(alias = "MONTH")]
    Month,
}

/// Clamping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClampingConfig {
    /// Grid to align to
    pub target: ClampingTarget,

    /// First day of the week, required for `week`
    #[serde(default)]
    pub weekday: Option<String>,

    /// Round slice boundaries up (default) or down
    #[serde(default = "default_ceiling")]
    pub ceiling: bool,
}

fn default_ceiling() -> bool {
    true
}

impl ClampingConfig {
    /// Parsed weekday of week clamping
    pub fn weekday(&self) -> Result<Weekday> {
        let raw = self.weekday.as_deref().ok_or_else(|| {
            Error::invalid_value("clamping.weekday", "week clamping requires a weekday")
        })?;
        raw.parse::<Weekday>()
            .map_err(|_| Error::invalid_value("clamping.weekday", format!("unknown weekday: {raw}")))
    }
}

// ============================================================================
// Loading and Validation
// ============================================================================

impl IncrementalConfig {
    /// Create a minimal config
    pub fn new(name: impl Into<String>, cursor_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            sync_mode: SyncMode::Incremental,
            cursor_field: cursor_field.into(),
            cursor_format: CursorFormat::default(),
            datetime_format: None,
            input_datetime_formats: Vec::new(),
            start: None,
            end: None,
            step: None,
            cursor_granularity: None,
            lookback_window: None,
            slice_boundary_fields: None,
            clamping: None,
            legacy_state_output: false,
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Check field combinations that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_value("name", "stream name must not be empty"));
        }
        if self.cursor_field.trim().is_empty() {
            return Err(Error::invalid_value("cursor_field", "must not be empty"));
        }
        if self.cursor_format == CursorFormat::Custom && self.datetime_format.is_none() {
            return Err(Error::invalid_value(
                "datetime_format",
                "required when cursor_format is custom",
            ));
        }
        if self.step.is_some() != self.cursor_granularity.is_some() {
            return Err(Error::invalid_value(
                "step",
                "step and cursor_granularity must be defined together",
            ));
        }

        self.step_duration()?;
        self.granularity()?;
        self.lookback()?;
        if let Some(clamping) = &self.clamping {
            if clamping.target == ClampingTarget::Week {
                clamping.weekday()?;
            }
        }
        Ok(())
    }

    /// Stream this config describes
    pub fn stream_descriptor(&self) -> StreamDescriptor {
        let stream = StreamDescriptor::new(&self.name);
        match &self.namespace {
            Some(namespace) => stream.with_namespace(namespace),
            None => stream,
        }
    }

    /// Parsed slice range, always positive
    pub fn step_duration(&self) -> Result<Option<Duration>> {
        parse_optional_duration("step", self.step.as_deref(), false)
    }

    /// Parsed cursor granularity, always positive
    pub fn granularity(&self) -> Result<Option<Duration>> {
        parse_optional_duration(
            "cursor_granularity",
            self.cursor_granularity.as_deref(),
            false,
        )
    }

    /// Parsed lookback window, never negative
    pub fn lookback(&self) -> Result<Option<Duration>> {
        parse_optional_duration("lookback_window", self.lookback_window.as_deref(), true)
    }
}

fn parse_optional_duration(
    field: &str,
    value: Option<&str>,
    allow_zero: bool,
) -> Result<Option<Duration>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let duration = parse_duration(raw).map_err(|e| Error::invalid_value(field, e.to_string()))?;

    if duration < Duration::zero() || (!allow_zero && duration.is_zero()) {
        let bound = if allow_zero { "negative" } else { "zero or negative" };
        return Err(Error::invalid_value(
            field,
            format!("duration must not be {bound}: {raw}"),
        ));
    }
    Ok(Some(duration))
}

// ============================================================================
// Duration Parsing
// ============================================================================

/// Parse an ISO 8601 duration (`P1D`, `PT1H30M`) or a short one (`1d`, `2h`)
///
/// Years and months have no fixed length and are rejected.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.starts_with('P') {
        return parse_iso_duration(s);
    }

    // Try to parse as number with suffix using strip_suffix
    let (num_str, suffix) = if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 'd')
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 'h')
    } else if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 'f')
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 'm')
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 's')
    } else if let Some(stripped) = s.strip_suffix('w') {
        (stripped, 'w')
    } else {
        // Assume days if no suffix
        (s, 'd')
    };

    let num: i64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("Invalid duration number: {num_str}")))?;

    let duration = match suffix {
        'w' => Duration::try_weeks(num),
        'd' => Duration::try_days(num),
        'h' => Duration::try_hours(num),
        'm' => Duration::try_minutes(num),
        's' => Duration::try_seconds(num),
        'f' => Duration::try_milliseconds(num),
        _ => None,
    };

    duration.ok_or_else(|| Error::config(format!("Duration out of range: {s}")))
}

fn parse_iso_duration(s: &str) -> Result<Duration> {
    let captures = ISO_DURATION_REGEX
        .captures(s)
        .filter(|_| s != "P" && !s.ends_with('T'))
        .ok_or_else(|| Error::config(format!("Invalid ISO 8601 duration: {s}")))?;

    if captures.get(1).is_some() || captures.get(2).is_some() {
        return Err(Error::config(format!(
            "Durations in years or months are not supported: {s}"
        )));
    }

    let number = |index: usize| -> Result<i64> {
        captures.get(index).map_or(Ok(0), |m| {
            m.as_str()
                .parse()
                .map_err(|_| Error::config(format!("Invalid duration number: {}", m.as_str())))
        })
    };

    let seconds: f64 = match captures.get(7) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| Error::config(format!("Invalid duration seconds: {}", m.as_str())))?,
        None => 0.0,
    };

    let parts = [
        Duration::try_weeks(number(3)?),
        Duration::try_days(number(4)?),
        Duration::try_hours(number(5)?),
        Duration::try_minutes(number(6)?),
        Duration::try_milliseconds((seconds * 1000.0).round() as i64),
    ];

    parts
        .into_iter()
        .try_fold(Duration::zero(), |total, part| total.checked_add(&part?))
        .ok_or_else(|| Error::config(format!("Duration out of range: {s}")))
}
