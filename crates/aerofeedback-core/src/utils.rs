//! Coercion helpers shared by payload translation and the DTO deserializers

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Department id used when a draft carries no usable department
pub const DEFAULT_DEPARTMENT_ID: i64 = 1;

/// Trainer id used when a draft carries no usable trainer
pub const DEFAULT_TRAINER_ID: i64 = 1;

/// A date as entered on a form: free text, an already-typed timestamp, or
/// whatever other JSON value the caller handed over.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Text as typed; passed through unchanged
    Text(String),
    /// A typed timestamp
    Timestamp(DateTime<Utc>),
    /// Any other JSON value (epoch milliseconds, objects, ...)
    Other(Value),
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Value> for DateInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for DateInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// Render a timestamp the way the backend stores it: ISO-8601, UTC,
/// millisecond precision (`2024-05-01T09:30:00.000Z`).
pub fn to_iso_string(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the timestamp shapes the backend is known to emit.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC), the
/// same with a space separator, and bare dates (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Coerce a due date for the backend.
///
/// Strings pass through unchanged (blank becomes `None`), timestamps become
/// ISO strings, and anything else is parsed best-effort. Never fails: an
/// unusable value yields `None`.
pub fn coerce_date(input: &DateInput) -> Option<String> {
    match input {
        DateInput::Text(text) if text.trim().is_empty() => None,
        DateInput::Text(text) => Some(text.clone()),
        DateInput::Timestamp(timestamp) => Some(to_iso_string(timestamp)),
        DateInput::Other(value) => coerce_date_value(value),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_date_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => {
            let millis = number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| to_iso_string(&dt))
        }
        Value::String(text) => parse_timestamp(text).map(|dt| to_iso_string(&dt)),
        _ => None,
    }
}

/// Coerce a department or trainer identifier to an integer.
///
/// Integers pass through, numeric strings are parsed, and anything else
/// (including non-positive ids) falls back to `fallback`.
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_id(value: Option<&Value>, fallback: i64) -> i64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.filter(|id| *id > 0).unwrap_or(fallback)
}

/// Deserialize an identifier that may arrive as a string or a number
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

/// Deserialize an optional timestamp in any shape [`parse_timestamp`] accepts.
/// Unparsable values become `None` rather than failing the whole record.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => parse_timestamp(&text),
        _ => None,
    })
}
