use serde_json::{json, Map, Value};

use super::schema::ColumnDescriptor;

/// Placeholder value for a column type, matched case-insensitively by
/// substring. The first matching rule wins.
pub fn sample_value(data_type: &str) -> Value {
    let t = data_type.to_lowercase();
    let has = |needle: &str| t.contains(needle);

    if has("int") || has("serial") {
        json!(1)
    } else if has("float") || has("double") || has("numeric") || has("decimal") {
        json!(1.0)
    } else if has("bool") {
        json!(true)
    } else if has("date") {
        json!("2023-01-01")
    } else if has("time") {
        if has("with time zone") || has("timezone") {
            json!("2023-01-01T12:00:00Z")
        } else {
            json!("2023-01-01T12:00:00")
        }
    } else if has("json") {
        json!({"key": "value"})
    } else if has("array") {
        json!([1, 2, 3])
    } else if has("char") || has("text") || has("varchar") {
        json!("sample_text")
    } else {
        json!("unknown_type")
    }
}

/// Pretty-printed JSON object with one sample value per column, in column order.
pub fn sample_data_structure(columns: &[ColumnDescriptor]) -> String {
    let sample: Map<String, Value> = columns
        .iter()
        .map(|c| (c.name.clone(), sample_value(&c.data_type)))
        .collect();
    serde_json::to_string_pretty(&Value::Object(sample)).unwrap_or_else(|e| {
        log::warn!("Failed to render sample data structure: {}", e);
        "{}".to_string()
    })
}
