//! Builds cursors from configuration

use super::{ConcurrentCursor, Cursor, CursorField, FinalStateCursor};
use crate::clamping::{
    clamped_end_provider, ClampingStrategy, DayClampingStrategy, MonthClampingStrategy,
    WeekClampingStrategy,
};
use crate::config::{ClampingConfig, ClampingTarget, IncrementalConfig};
use crate::engine::MessageSink;
use crate::error::{Error, Result};
use crate::state::{
    fixed_end_provider, now_end_provider, parse_datetime, CustomFormatConverter, EndProvider,
    EpochValueConverter, IsoMillisConverter, StateConverter,
};
use crate::types::{CursorFormat, JsonValue, SyncMode};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

type DateTimeConverter = Arc<dyn StateConverter<Value = DateTime<Utc>>>;
type SharedStrategy = Arc<dyn ClampingStrategy<DateTime<Utc>>>;

/// Creates cursors for configured streams
#[derive(Clone, Default)]
pub struct CursorFactory {
    end_provider: Option<EndProvider<DateTime<Utc>>>,
}

impl CursorFactory {
    /// Create a factory using the wall clock as sync end
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the sync end used when the config sets none
    #[must_use]
    pub fn with_end_provider(mut self, end_provider: EndProvider<DateTime<Utc>>) -> Self {
        self.end_provider = Some(end_provider);
        self
    }

    /// Converter for the configured cursor format
    pub fn converter(config: &IncrementalConfig) -> Result<DateTimeConverter> {
        let granularity = config.granularity()?;
        let legacy = config.legacy_state_output;

        let converter: DateTimeConverter = match config.cursor_format {
            CursorFormat::Epoch => Arc::new(EpochValueConverter::new().with_sequential_state(legacy)),
            CursorFormat::IsoMillis => Arc::new(
                IsoMillisConverter::new()
                    .with_sequential_state(legacy)
                    .with_cursor_granularity(granularity),
            ),
            CursorFormat::Custom => {
                let format = config.datetime_format.as_deref().ok_or_else(|| {
                    Error::invalid_value("datetime_format", "required when cursor_format is custom")
                })?;
                Arc::new(
                    CustomFormatConverter::new(format)?
                        .with_input_formats(config.input_datetime_formats.clone())?
                        .with_sequential_state(legacy)
                        .with_cursor_granularity(granularity),
                )
            }
        };
        Ok(converter)
    }

    /// Build the interval cursor of an incremental stream
    pub fn create_concurrent_cursor(
        &self,
        config: &IncrementalConfig,
        prior_state: &JsonValue,
        sink: Arc<dyn MessageSink>,
    ) -> Result<ConcurrentCursor<DateTime<Utc>>> {
        config.validate()?;
        let converter = Self::converter(config)?;
        let granularity = config.granularity()?;

        let start = config
            .start
            .as_deref()
            .map(|raw| parse_boundary(&converter, "start", raw))
            .transpose()?;

        let mut end_provider = match config.end.as_deref() {
            Some(raw) => fixed_end_provider(parse_boundary(&converter, "end", raw)?),
            None => self.end_provider.clone().unwrap_or_else(now_end_provider),
        };
        let mut clamping_strategy: Option<SharedStrategy> = None;

        if let Some(clamping) = &config.clamping {
            let (strategy, end_strategy, default_granularity) = clamping_strategies(clamping)?;
            end_provider = clamped_end_provider(
                end_strategy,
                end_provider,
                granularity.unwrap_or(default_granularity),
            );
            clamping_strategy = Some(strategy);
        }

        let mut builder = ConcurrentCursor::builder(
            config.stream_descriptor(),
            converter,
            CursorField::new(&config.cursor_field),
            end_provider,
        );
        if let Some(strategy) = clamping_strategy {
            builder = builder.with_clamping_strategy(strategy);
        }
        if let Some(fields) = &config.slice_boundary_fields {
            builder = builder.with_slice_boundary_fields(&fields.start_field, &fields.end_field);
        }

        builder
            .with_start(start)
            .with_lookback_window(config.lookback()?)
            .with_slice_range(config.step_duration()?)
            .with_cursor_granularity(granularity)
            .build(prior_state, sink)
    }

    /// Build the cursor matching the stream's sync mode
    pub fn create_cursor(
        &self,
        config: &IncrementalConfig,
        prior_state: &JsonValue,
        sink: Arc<dyn MessageSink>,
    ) -> Result<Arc<dyn Cursor>> {
        let cursor: Arc<dyn Cursor> = match config.sync_mode {
            SyncMode::Incremental => {
                Arc::new(self.create_concurrent_cursor(config, prior_state, sink)?)
            }
            SyncMode::FullRefresh => {
                Arc::new(FinalStateCursor::new(config.stream_descriptor(), sink))
            }
        };
        Ok(cursor)
    }
}

impl std::fmt::Debug for CursorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorFactory")
            .field("fixed_end", &self.end_provider.is_some())
            .finish()
    }
}

/// Parse a configured bound with the cursor format, falling back to ISO 8601
fn parse_boundary(
    converter: &DateTimeConverter,
    field: &str,
    raw: &str,
) -> Result<DateTime<Utc>> {
    converter
        .parse_value(&JsonValue::String(raw.to_string()))
        .or_else(|_| parse_datetime(raw))
        .map_err(|e| Error::invalid_value(field, e.to_string()))
}

/// Slice strategy, end strategy and default end granularity
fn clamping_strategies(
    config: &ClampingConfig,
) -> Result<(SharedStrategy, SharedStrategy, Duration)> {
    let ceiling = config.ceiling;

    match config.target {
        ClampingTarget::Day => {
            let slice: SharedStrategy = Arc::new(if ceiling {
                DayClampingStrategy::ceiling()
            } else {
                DayClampingStrategy::floor()
            });
            let end: SharedStrategy = Arc::new(DayClampingStrategy::floor());
            Ok((slice, end, Duration::seconds(1)))
        }
        ClampingTarget::Week => {
            let weekday = config.weekday()?;
            let slice: SharedStrategy = Arc::new(if ceiling {
                WeekClampingStrategy::ceiling(weekday)
            } else {
                WeekClampingStrategy::floor(weekday)
            });
            let end: SharedStrategy = Arc::new(WeekClampingStrategy::floor(weekday));
            Ok((slice, end, Duration::days(1)))
        }
        ClampingTarget::Month => {
            let slice: SharedStrategy = Arc::new(if ceiling {
                MonthClampingStrategy::ceiling()
            } else {
                MonthClampingStrategy::floor()
            });
            let end: SharedStrategy = Arc::new(MonthClampingStrategy::floor());
            Ok((slice, end, Duration::days(1)))
        }
    }
}
