//! State manager implementation
//!
//! Keeps the latest checkpoint per stream and persists it with atomic writes.

use super::types::State;
use crate::engine::Message;
use crate::error::{Error, Result, ResultExt};
use crate::types::{JsonValue, StreamDescriptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// State manager for persisting and loading checkpoints
#[derive(Debug)]
pub struct StateManager {
    /// Path to the state file
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
    /// Whether to auto-save on every update
    auto_save: bool,
}

impl StateManager {
    /// Create a new state manager with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: true,
        }
    }

    /// Create a state manager with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read state file")?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// Create a state manager from inline JSON string
    ///
    /// Accepts either the persisted `{"streams": {...}}` document or a bare
    /// map of stream name to checkpoint.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(parse_state(json)?)),
            auto_save: false,
        })
    }

    /// Load state from file
    pub async fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .context("Failed to read state file")?;
        let loaded_state = parse_state(&contents)?;

        let mut state = self.state.write().await;
        *state = loaded_state;

        Ok(())
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path).await
    }

    /// Save state to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .context("Failed to write state file")?;
        tokio::fs::rename(&temp_path, path)
            .await
            .context("Failed to rename state file")?;

        debug!(path = %path.display(), "State saved");
        Ok(())
    }

    /// Get a read lock on the current state
    pub async fn state(&self) -> tokio::sync::RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        Ok(serde_json::to_string(&*state)?)
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        Ok(serde_json::to_string_pretty(&*state)?)
    }

    /// Get the checkpoint of a stream
    pub async fn get_stream_state(&self, stream: &StreamDescriptor) -> Option<JsonValue> {
        let state = self.state.read().await;
        state.get_stream(&stream.to_string()).cloned()
    }

    /// Replace the checkpoint of a stream
    pub async fn set_stream_state(&self, stream: &StreamDescriptor, data: JsonValue) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set_stream(stream.to_string(), data);
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Record a published message; returns whether it was a checkpoint
    pub async fn apply(&self, message: &Message) -> Result<bool> {
        match message {
            Message::State { stream, data } => {
                self.set_stream_state(stream, data.clone()).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            auto_save: self.auto_save,
        }
    }
}

fn parse_state(contents: &str) -> Result<State> {
    let value: JsonValue = serde_json::from_str(contents)?;
    match value {
        JsonValue::Object(ref object) if object.contains_key("streams") => {
            Ok(serde_json::from_value(value)?)
        }
        JsonValue::Object(object) => Ok(State {
            streams: object.into_iter().collect(),
        }),
        other => Err(Error::config(format!(
            "State document must be a JSON object, got {other}"
        ))),
    }
}
