use std::io::Write;

use crate::error::{Result, SeedKitError};
use crate::generate::orchestrator::GenerationResult;
use crate::generate::Row;

/// Write generated data as CSV files (one section per table).
/// Tables are separated by a comment header line.
pub fn write_csv<W: Write>(writer: &mut W, result: &GenerationResult) -> Result<()> {
    for table_name in &result.insertion_order {
        let rows = &result.rows[table_name];
        if rows.is_empty() {
            continue;
        }

        writeln!(writer, "# Table: {}", table_name).map_err(|e| SeedKitError::Output {
            message: format!("writing CSV header for {}", table_name),
            source: e,
        })?;

        write_csv_table(writer, table_name, rows)?;

        writeln!(writer).map_err(|e| SeedKitError::Output {
            message: "writing newline".to_string(),
            source: e,
        })?;
    }

    Ok(())
}

/// Write CSV for a single table to a writer.
pub fn write_csv_table<W: Write>(writer: &mut W, table_name: &str, rows: &[Row]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let columns: Vec<&String> = rows[0].keys().collect();
    writeln!(
        writer,
        "{}",
        columns
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(",")
    )
    .map_err(|e| SeedKitError::Output {
        message: format!("writing CSV columns for {}", table_name),
        source: e,
    })?;

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|col| {
                row.get(*col)
                    .map(|v| csv_escape(&v.to_csv_string()))
                    .unwrap_or_default()
            })
            .collect();

        writeln!(writer, "{}", values.join(",")).map_err(|e| SeedKitError::Output {
            message: format!("writing CSV row for {}", table_name),
            source: e,
        })?;
    }

    Ok(())
}

/// Escape a string for CSV: quote if it contains comma, quote, or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::value::Value;
    use indexmap::IndexMap;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("hello,world"), "\"hello,world\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn writes_one_section_per_table_in_insertion_order() {
        let mut rows = IndexMap::new();
        let mut row = IndexMap::new();
        row.insert("id".to_string(), Value::Int(1));
        rows.insert("users".to_string(), vec![row]);

        let result = GenerationResult {
            rows,
            pending_updates: Vec::new(),
            insertion_order: vec!["users".to_string()],
        };

        let mut output = Vec::new();
        write_csv(&mut output, &result).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("# Table: users"));
        assert!(text.contains("id"));
    }
}
