use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter::normalize_field;

/// Fields that only the repository may set, never API input
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_at", "updated_at", "created_by"];

/// Errors that can occur when building a document from input
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(String),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// A schemaless document: a JSON object that carries `id` once stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create document from API input JSON, rejecting system fields
    /// (including their legacy spellings)
    pub fn from_api_input(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(map) => {
                if let Some(key) = map.keys().find(|k| SYSTEM_FIELDS.contains(&normalize_field(k))) {
                    return Err(RecordError::SystemFieldNotAllowed(key.clone()));
                }
                Ok(Self(map))
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    /// Wrap a stored value (allows system fields)
    pub fn from_stored(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Set a regular field (chainable)
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn has_system_field(&self) -> Option<&str> {
        self.0
            .keys()
            .find(|k| SYSTEM_FIELDS.contains(&k.as_str()))
            .map(String::as_str)
    }

    /// Stamp `id`, `created_at` and, when known, `created_by`
    pub fn stamp_created(&mut self, id: &str, caller: Option<&str>) {
        self.0.insert("id".to_string(), Value::String(id.to_string()));
        self.0.insert("created_at".to_string(), Value::String(now_timestamp()));
        if let Some(caller) = caller {
            self.0.insert("created_by".to_string(), Value::String(caller.to_string()));
        }
    }

    pub fn stamp_updated(&mut self) {
        self.0.insert("updated_at".to_string(), Value::String(now_timestamp()));
    }

    /// Shallow merge: top-level keys of `patch` replace existing ones
    pub fn merge(&mut self, patch: Document) {
        self.0.extend(patch.0);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// RFC 3339 UTC with fixed microsecond precision, so string order is time order
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
