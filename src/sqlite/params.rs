use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

/// Timestamps are stored as `%F %T%.f` text.
#[must_use]
pub fn timestamp_to_sqlite_value(dt: &NaiveDateTime) -> Value {
    Value::Text(dt.format("%F %T%.f").to_string())
}

/// JSON is stored as its serialized text.
#[must_use]
pub fn json_to_sqlite_value(json: &JsonValue) -> Value {
    Value::Text(json.to_string())
}
