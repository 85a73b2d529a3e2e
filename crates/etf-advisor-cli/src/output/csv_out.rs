use serde_json::Value;
use std::io;

use crate::output::format_value;

/// Write output as CSV to stdout.
///
/// When the output carries a `rows` array, only the rows are written;
/// summaries and warnings are JSON/table concerns.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("rows") {
                write_rows_csv(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    if matches!(key.as_str(), "warnings" | "methodology") {
                        continue;
                    }
                    let _ = wtr.write_record([key.as_str(), &format_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_rows_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    if rows.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for row in rows {
            if let Value::Object(map) = row {
                let cells: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&cells);
            }
        }
    } else {
        for row in rows {
            let _ = wtr.write_record([&format_value(row)]);
        }
    }
}
