use serde_json::Value;
use tabled::{builder::Builder, Table};

use crate::output::format_value;

/// Format output as a table using the tabled crate.
///
/// Objects carrying a `rows` array render the rows as the main table,
/// followed by the summary (field/value), warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("rows") {
                print_rows_table(rows);
            } else {
                print_field_table(map);
            }

            if let Some(Value::Object(summary)) = map.get("summary") {
                println!();
                print_field_table(summary);
            }

            if let Some(Value::Array(warnings)) = map.get("warnings") {
                if !warnings.is_empty() {
                    println!("\nWarnings:");
                    for w in warnings {
                        if let Value::String(s) = w {
                            println!("  - {}", s);
                        }
                    }
                }
            }

            if let Some(Value::String(meth)) = map.get("methodology") {
                println!("\nMethodology: {}", meth);
            }
        }
        Value::Array(arr) => print_rows_table(arr),
        _ => println!("{}", value),
    }
}

fn print_rows_table(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    // Column order follows the first row.
    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for row in rows {
            if let Value::Object(map) = row {
                let cells: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(cells);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for row in rows {
            println!("{}", format_value(row));
        }
    }
}

fn print_field_table(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if matches!(key.as_str(), "rows" | "summary" | "warnings" | "methodology") {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    let table = Table::from(builder);
    println!("{}", table);
}
