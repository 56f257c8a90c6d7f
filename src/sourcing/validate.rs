use crate::sourcing::fields::Entry;
use crate::storage::repository::{RecordFields, SchoolFields};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    City,
    County,
    School,
    District,
    Record,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::City => "city",
            EntityKind::County => "county",
            EntityKind::School => "school",
            EntityKind::District => "district",
            EntityKind::Record => "record",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{kind} validation failed on `{field}`: {reason}")]
pub struct ValidationError {
    pub kind: EntityKind,
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn missing(kind: EntityKind, field: &'static str) -> Self {
        Self {
            kind,
            field,
            reason: "required field is missing".to_string(),
        }
    }

    fn unusable(kind: EntityKind, field: &'static str, value: &Value) -> Self {
        Self {
            kind,
            field,
            reason: format!("unusable value {}", value),
        }
    }
}

fn required_str(
    entry: &Entry,
    kind: EntityKind,
    field: &'static str,
) -> Result<String, ValidationError> {
    match entry.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ValidationError::unusable(kind, field, other)),
        None => Err(ValidationError::missing(kind, field)),
    }
}

fn optional_rate(
    entry: &Entry,
    kind: EntityKind,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    let value = match entry.get(field) {
        None => return Ok(None),
        Some(v) => v,
    };
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ValidationError::unusable(kind, field, value)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ValidationError::unusable(kind, field, value)),
        other => Err(ValidationError::unusable(kind, field, other)),
    }
}

/// Portal boolean columns come in many spellings ("Y", "PUBLIC", true, 1).
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "public" => Some(true),
        "n" | "no" | "false" | "0" | "private" => Some(false),
        _ => None,
    }
}

fn flag(
    entry: &Entry,
    kind: EntityKind,
    field: &'static str,
    default: Option<bool>,
) -> Result<bool, ValidationError> {
    let value = match entry.get(field) {
        None => return default.ok_or_else(|| ValidationError::missing(kind, field)),
        Some(v) => v,
    };
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64() != Some(0.0)),
        Value::String(s) => {
            parse_flag(s).ok_or_else(|| ValidationError::unusable(kind, field, value))
        }
        other => Err(ValidationError::unusable(kind, field, other)),
    }
}

pub fn city(entry: &Entry) -> Result<String, ValidationError> {
    required_str(entry, EntityKind::City, "city")
}

pub fn county(entry: &Entry) -> Result<String, ValidationError> {
    required_str(entry, EntityKind::County, "county")
}

pub fn district(entry: &Entry) -> Result<String, ValidationError> {
    required_str(entry, EntityKind::District, "district")
}

pub fn school(entry: &Entry) -> Result<SchoolFields, ValidationError> {
    Ok(SchoolFields {
        code: required_str(entry, EntityKind::School, "code")?,
        name: required_str(entry, EntityKind::School, "name")?,
        public: flag(entry, EntityKind::School, "public", None)?,
    })
}

/// A school on roster that did not report has no `reported` key after the
/// falsy filter, so absence reads as "did not report".
pub fn record(entry: &Entry) -> Result<RecordFields, ValidationError> {
    Ok(RecordFields {
        reported: flag(entry, EntityKind::Record, "reported", Some(false))?,
        up_to_date: optional_rate(entry, EntityKind::Record, "up_to_date")?,
        conditional: optional_rate(entry, EntityKind::Record, "conditional")?,
        pme: optional_rate(entry, EntityKind::Record, "pme")?,
        pbe: optional_rate(entry, EntityKind::Record, "pbe")?,
        dtp: optional_rate(entry, EntityKind::Record, "dtp")?,
        polio: optional_rate(entry, EntityKind::Record, "polio")?,
        mmr: optional_rate(entry, EntityKind::Record, "mmr")?,
        hib: optional_rate(entry, EntityKind::Record, "hib")?,
        hepb: optional_rate(entry, EntityKind::Record, "hepb")?,
        vari: optional_rate(entry, EntityKind::Record, "vari")?,
    })
}
