//! Formatting helpers for debug output.

use serde_json::Value;

use crate::event::EventRecord;

/// Render a record as a two-column `field | value` table.
pub fn tabulate(record: &EventRecord) -> String {
    let rows: Vec<(String, String)> = record
        .to_map()
        .into_iter()
        .map(|(key, value)| (key, display_value(&value)))
        .collect();

    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!("{:<width$} | {}\n", key, value, width = width));
    }
    out
}

/// Strings unquoted, everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
