use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The three fields the updater tries to fill.
pub const TARGET_FIELDS: [&str; 3] = ["date", "authors", "abstract"];

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid collection: {0}")]
    Shape(String),
}

/// One paper entry of the collection.
///
/// Backed by an insertion-ordered JSON object so that fields this tool does
/// not know about (`title`, `tags`, ...) and the order of `urls` survive a
/// load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperRecord(Map<String, Value>);

impl PaperRecord {
    /// Identifier used in log lines; `?` when the record has none.
    pub fn id(&self) -> String {
        match self.0.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "?".to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// `(source name, url)` pairs in the order they appear in the record.
    /// Entries whose value is not a string keep their slot with `None`.
    pub fn urls(&self) -> Vec<(&str, Option<&str>)> {
        match self.0.get("urls") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True when `field` is absent or holds a falsy value.
    pub fn is_missing(&self, field: &str) -> bool {
        self.0.get(field).map_or(true, is_falsy)
    }

    /// True when every target field already holds data.
    pub fn is_complete(&self) -> bool {
        TARGET_FIELDS.iter().all(|f| !self.is_missing(f))
    }

    /// Store `value` under `field` only if the field is currently missing.
    /// Returns whether the record changed.
    pub fn fill(&mut self, field: &str, value: Value) -> bool {
        if !self.is_missing(field) || is_falsy(&value) {
            return false;
        }
        self.0.insert(field.to_string(), value);
        true
    }
}

#[cfg(test)]
impl PaperRecord {
    pub fn date(&self) -> Option<&str> {
        self.0.get("date").and_then(Value::as_str)
    }

    pub fn authors(&self) -> Option<Vec<&str>> {
        self.0
            .get("authors")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.0.get("abstract").and_then(Value::as_str)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Parse a collection: a JSON array of objects.
pub fn parse_collection(text: &str) -> Result<Vec<PaperRecord>, RecordError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(RecordError::Shape("top level is not an array".to_string()));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(PaperRecord(map)),
            _ => Err(RecordError::Shape(format!("entry {} is not an object", i))),
        })
        .collect()
}

pub fn load_collection(path: &Path) -> Result<Vec<PaperRecord>, RecordError> {
    let text = std::fs::read_to_string(path)?;
    parse_collection(&text)
}

/// Pretty-print with two-space indentation; non-ASCII stays literal.
pub fn render_collection(records: &[PaperRecord]) -> Result<String, RecordError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Write the whole collection, replacing whatever was at `path`.
pub fn save_collection(path: &Path, records: &[PaperRecord]) -> Result<(), RecordError> {
    let text = render_collection(records)?;
    std::fs::write(path, text)?;
    Ok(())
}
