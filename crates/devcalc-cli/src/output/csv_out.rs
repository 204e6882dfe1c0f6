use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// When the result carries a `cash_flow` table that table is written, one
/// row per quarter; otherwise the result is flattened to field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("cash_flow") {
                write_array_csv(&mut wtr, rows);
            } else if let Some(Value::Array(rows)) = map.get("quarters") {
                write_array_csv(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                write_fields(&mut wtr, "", map);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => write_fields(wtr, &name, inner),
            _ => {
                let _ = wtr.write_record([name.as_str(), &format_csv_value(val)]);
            }
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
