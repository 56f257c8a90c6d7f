use crate::portal::RawEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One content row after renaming, keyed by canonical field names.
pub type Entry = serde_json::Map<String, Value>;

/// Per-dataset field translation table: canonical name -> source name. A
/// null or blank source name means the canonical name needs no override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldsMap(pub HashMap<String, Option<String>>);

impl FieldsMap {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Source name -> canonical name, for renaming incoming rows. Entries
    /// without an override simply do not appear.
    pub fn inverse(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .filter_map(|(canonical, source)| {
                source
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(|s| (s.to_string(), canonical.clone()))
            })
            .collect()
    }
}

/// Blank upstream values must read as absent, never as "present but empty".
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Rename one raw row to canonical field names: falsy values are dropped,
/// mapped keys are renamed, everything else passes through unchanged.
pub fn apply(inverse: &HashMap<String, String>, raw: RawEntry) -> Entry {
    raw.into_iter()
        .filter(|(_, v)| !is_falsy(v))
        .map(|(k, v)| (inverse.get(&k).cloned().unwrap_or(k), v))
        .collect()
}
