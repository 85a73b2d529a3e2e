use serde_json::Value;

use crate::output::format_value;

/// Print just the key answer from the output.
///
/// Heuristic: prefer the summary object, then well-known headline fields,
/// then fall back to the row count.
pub fn print_minimal(value: &Value) {
    let map = match value.as_object() {
        Some(m) => m,
        None => {
            println!("{}", format_value(value));
            return;
        }
    };

    if let Some(Value::Object(summary)) = map.get("summary") {
        for (key, val) in summary {
            println!("{}={}", key, format_value(val));
        }
        return;
    }

    // Headline fields in priority order.
    let priority_keys = [
        "Rentabilidad_Esperada_Cliente_%",
        "Capital_Final",
        "scored",
        "clients",
    ];
    for key in &priority_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                println!("{}", format_value(val));
                return;
            }
        }
    }

    if let Some(Value::Array(rows)) = map.get("rows") {
        println!("{}", rows.len());
        return;
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_value(val));
    }
}
