//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::IncrementalConfig;
use crate::cursor::{Cursor, CursorFactory};
use crate::engine::NoopSink;
use crate::error::{Error, Result};
use crate::state::StateManager;
use crate::types::{JsonValue, StreamDescriptor};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
    factory: CursorFactory,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            factory: CursorFactory::new(),
        }
    }

    /// Use a custom cursor factory (fixed sync end in tests)
    #[must_use]
    pub fn with_factory(mut self, factory: CursorFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        for message in self.execute().await? {
            self.output_message(&message);
        }
        Ok(())
    }

    /// Run the CLI command and return its output messages
    pub async fn execute(&self) -> Result<Vec<JsonValue>> {
        match &self.cli.command {
            Commands::Slices => self.slices().await,
            Commands::State { write } => self.state(*write).await,
            Commands::Validate => self.validate().await,
        }
    }

    /// Load the cursor configuration
    fn load_config(&self) -> Result<IncrementalConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Cursor config not specified (use -C flag)"))?;

        let mut config = IncrementalConfig::from_file(path)?;
        if let Some(stream) = &self.cli.stream {
            config.name.clone_from(stream);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Config, state store and cursor of the selected stream
    async fn open_cursor(&self) -> Result<(IncrementalConfig, StateManager, Arc<dyn Cursor>)> {
        let config = self.load_config()?;
        let manager = self.load_state()?;
        let stream = config.stream_descriptor();
        let prior = manager
            .get_stream_state(&stream)
            .await
            .unwrap_or(JsonValue::Null);
        debug!(stream = %stream, "Prior state: {prior}");

        let cursor = self
            .factory
            .create_cursor(&config, &prior, Arc::new(NoopSink))?;
        Ok((config, manager, cursor))
    }

    /// Print the next slices
    async fn slices(&self) -> Result<Vec<JsonValue>> {
        let (_, _, cursor) = self.open_cursor().await?;
        let stream = cursor.stream();

        Ok(cursor
            .stream_slices()
            .into_iter()
            .map(|slice| json!({ "type": "SLICE", "stream": stream, "slice": slice }))
            .collect())
    }

    /// Print (and optionally persist) the normalized checkpoint
    async fn state(&self, write: bool) -> Result<Vec<JsonValue>> {
        let (_, manager, cursor) = self.open_cursor().await?;
        let stream = cursor.stream().clone();
        let data = cursor.state();

        if write {
            let path = self
                .cli
                .state
                .as_ref()
                .ok_or_else(|| Error::config("--write requires a state file (use -s flag)"))?;
            manager.set_stream_state(&stream, data.clone()).await?;
            manager.save_to_file(path).await?;
        }

        Ok(vec![state_message(&stream, data)])
    }

    /// Validate config and prior state
    async fn validate(&self) -> Result<Vec<JsonValue>> {
        let (config, _, cursor) = self.open_cursor().await?;
        let slices = cursor.stream_slices().len();

        Ok(vec![json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Cursor for stream '{}' on field '{}' is valid, {slices} slices pending",
                    cursor.stream(),
                    config.cursor_field,
                )
            }
        })])
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn state_message(stream: &StreamDescriptor, data: JsonValue) -> JsonValue {
    json!({ "type": "STATE", "stream": stream, "data": data })
}
