use std::io::Write;

use base64::Engine;

use crate::error::{Result, SeedKitError};
use crate::generate::orchestrator::GenerationResult;
use crate::generate::value::Value;

/// Write a generation result as JSON using streaming serialization.
///
/// Writes directly to the writer table-by-table and row-by-row, avoiding
/// the OOM trap of building the entire JSON tree in memory before serializing.
/// Includes `_pending_updates` when present (FK columns left null by a
/// dependency cycle, resolved for a later `UPDATE` pass).
pub fn write_json<W: Write>(writer: &mut W, result: &GenerationResult) -> Result<()> {
    let table_count = result.insertion_order.len();
    let has_pending = !result.pending_updates.is_empty();
    let total_keys = table_count + if has_pending { 1 } else { 0 };

    write_str(writer, "{\n")?;

    for (table_idx, table_name) in result.insertion_order.iter().enumerate() {
        let rows = &result.rows[table_name];
        let safe_table_key = json_key(table_name)?;
        write_str(writer, &format!("  {}: [\n", safe_table_key))?;

        for (row_idx, row) in rows.iter().enumerate() {
            write_str(writer, "    {")?;

            let col_count = row.len();
            for (col_idx, (col_name, value)) in row.iter().enumerate() {
                let safe_col_key = json_key(col_name)?;
                let val_str = json_value(value)?;
                write_str(writer, &format!("\n      {}: {}", safe_col_key, val_str))?;
                if col_idx < col_count - 1 {
                    write_str(writer, ",")?;
                }
            }

            write_str(writer, "\n    }")?;
            if row_idx < rows.len() - 1 {
                write_str(writer, ",")?;
            }
            write_str(writer, "\n")?;
        }

        write_str(writer, "  ]")?;
        if table_idx < total_keys - 1 {
            write_str(writer, ",")?;
        }
        write_str(writer, "\n")?;
    }

    if has_pending {
        write_str(writer, "  \"_pending_updates\": [\n")?;
        let n = result.pending_updates.len();
        for (i, update) in result.pending_updates.iter().enumerate() {
            let safe_table = json_key(&update.table)?;
            let columns: Vec<String> = update
                .columns
                .iter()
                .map(|c| json_key(c))
                .collect::<Result<_>>()?;
            let values: Vec<String> = update
                .values
                .iter()
                .map(json_value)
                .collect::<Result<_>>()?;
            write_str(
                writer,
                &format!(
                    "    {{\"table\": {}, \"row_index\": {}, \"columns\": [{}], \"values\": [{}]}}",
                    safe_table,
                    update.row_index,
                    columns.join(", "),
                    values.join(", ")
                ),
            )?;
            if i < n - 1 {
                write_str(writer, ",")?;
            }
            write_str(writer, "\n")?;
        }
        write_str(writer, "  ]\n")?;
    }

    write_str(writer, "}\n")?;

    Ok(())
}

/// Helper to write a string slice and map IO errors.
fn write_str<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer
        .write_all(s.as_bytes())
        .map_err(|e| SeedKitError::Output {
            message: "writing JSON".to_string(),
            source: e,
        })
}

/// Serialize a string as an RFC 8259-compliant JSON key.
/// Uses serde_json instead of Rust's Debug format (`{:?}`) which does not
/// properly escape unicode control characters per the JSON spec.
fn json_key(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| SeedKitError::Other(format!("JSON key error: {}", e)))
}

/// Serialize a Value as an RFC 8259-compliant JSON value string.
fn json_value(value: &Value) -> Result<String> {
    let json_val = value_to_json(value);
    serde_json::to_string(&json_val)
        .map_err(|e| SeedKitError::Other(format!("JSON serialization error: {}", e)))
}

/// Convert a Value to its JSON representation.
///
/// Timestamps use ISO 8601 format with milliseconds and trailing 'Z'.
/// Bytes use Base64 encoding (standard alphabet with padding).
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::json!(*i),
        Value::Decimal { .. } => serde_json::Value::String(value.to_string()),
        Value::Float(f) => serde_json::json!(*f),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Timestamp(ts) => {
            serde_json::Value::String(format!("{}Z", ts.format("%Y-%m-%dT%H:%M:%S%.3f")))
        }
        Value::TimestampTz(ts) => {
            serde_json::Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        }
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => serde_json::Value::String(t.format("%H:%M:%S").to_string()),
        Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        Value::Json(j) => j.clone(),
        Value::Bytes(b) => {
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        Value::Default => serde_json::Value::String("DEFAULT".to_string()),
    }
}
