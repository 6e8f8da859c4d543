//! Cursor field accessor

use crate::error::{Error, Result};
use crate::partition::Record;
use crate::types::JsonValue;

/// The record attribute used as progress key
///
/// Keys may address nested objects with dots (`"data.updated_at"`); a key
/// that exists verbatim at the top level always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorField {
    key: String,
    path: Vec<String>,
}

impl CursorField {
    /// Create a cursor field
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let path = key.split('.').map(String::from).collect();
        Self { key, path }
    }

    /// The configured key, also used as the legacy state key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Extract the raw cursor value from a record
    pub fn extract_value<'a>(&self, record: &'a Record) -> Result<&'a JsonValue> {
        let found = match record.data.get(&self.key) {
            Some(value) => Some(value),
            None => self
                .path
                .iter()
                .try_fold(&record.data, |current, part| current.get(part)),
        };

        match found {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(Error::missing_cursor_field(&self.key)),
        }
    }
}

impl From<&str> for CursorField {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}
