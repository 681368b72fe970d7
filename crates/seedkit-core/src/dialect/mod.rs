//! # Dialect Writer
//!
//! Turns a [`GenerationResult`] into a single executable SQL script:
//! dialect-specific session framing, batched `INSERT`s (row order
//! preserved, at most [`INSERT_BATCH_SIZE`] tuples per statement), then an
//! `UPDATE` per [`PendingUpdate`] to patch in FK values that a dependency
//! cycle left null, then closing framing. Never executes anything against a
//! database — that stays the caller's job.

use std::io::Write;

use crate::error::{Result, SeedKitError};
use crate::generate::orchestrator::GenerationResult;
use crate::generate::Row;
use crate::schema::types::{DatabaseSchema, DatabaseType};

/// Maximum number of row tuples packed into a single `INSERT` statement.
pub const INSERT_BATCH_SIZE: usize = 1000;

pub struct DialectWriter<'a> {
    schema: &'a DatabaseSchema,
}

impl<'a> DialectWriter<'a> {
    pub fn new(schema: &'a DatabaseSchema) -> Self {
        Self { schema }
    }

    /// Write the full script: open framing, inserts for every table in
    /// insertion order, updates for every pending FK patch, close framing.
    pub fn write_script<W: Write>(
        &self,
        writer: &mut W,
        result: &GenerationResult,
        effective_deferred: bool,
    ) -> Result<()> {
        self.write_open(writer, effective_deferred)?;

        for table_name in &result.insertion_order {
            let rows = &result.rows[table_name];
            self.write_inserts(writer, table_name, rows)?;
        }

        if !result.pending_updates.is_empty() {
            write_line(writer, "")?;
            write_line(writer, "-- Deferred FK updates (dependency cycle)")?;
            for update in &result.pending_updates {
                self.write_update(writer, result, update)?;
            }
        }

        self.write_close(writer, effective_deferred)?;
        Ok(())
    }

    fn write_open<W: Write>(&self, writer: &mut W, effective_deferred: bool) -> Result<()> {
        match self.schema.database_type {
            DatabaseType::PostgreSQL => {
                write_line(writer, "BEGIN;")?;
                if effective_deferred {
                    write_line(writer, "SET CONSTRAINTS ALL DEFERRED;")?;
                }
            }
            DatabaseType::MySQL => {
                write_line(writer, "START TRANSACTION;")?;
                if effective_deferred {
                    write_line(writer, "SET FOREIGN_KEY_CHECKS = 0;")?;
                }
            }
            DatabaseType::SQLite => {
                if effective_deferred {
                    write_line(writer, "PRAGMA defer_foreign_keys = ON;")?;
                }
                write_line(writer, "BEGIN TRANSACTION;")?;
            }
        }
        Ok(())
    }

    fn write_close<W: Write>(&self, writer: &mut W, effective_deferred: bool) -> Result<()> {
        match self.schema.database_type {
            DatabaseType::PostgreSQL => write_line(writer, "COMMIT;")?,
            DatabaseType::MySQL => {
                write_line(writer, "COMMIT;")?;
                if effective_deferred {
                    write_line(writer, "SET FOREIGN_KEY_CHECKS = 1;")?;
                }
            }
            DatabaseType::SQLite => write_line(writer, "COMMIT;")?,
        }
        Ok(())
    }

    fn write_inserts<W: Write>(&self, writer: &mut W, table_name: &str, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        write_line(writer, "")?;
        write_line(writer, &format!("-- {}", table_name))?;

        let columns: Vec<&String> = rows[0].keys().collect();
        let quoted_table = self.quote_identifier(table_name);
        let quoted_columns: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();

        for batch in rows.chunks(INSERT_BATCH_SIZE) {
            write_line(
                writer,
                &format!(
                    "INSERT INTO {} ({}) VALUES",
                    quoted_table,
                    quoted_columns.join(", ")
                ),
            )?;

            let last = batch.len() - 1;
            for (i, row) in batch.iter().enumerate() {
                let tuple: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        row.get(*c)
                            .map(|v| v.to_sql_literal(&self.schema.database_type))
                            .unwrap_or_else(|| "NULL".to_string())
                    })
                    .collect();
                let terminator = if i == last { ";" } else { "," };
                write_line(writer, &format!("  ({}){}", tuple.join(", "), terminator))?;
            }
        }

        Ok(())
    }

    fn write_update<W: Write>(
        &self,
        writer: &mut W,
        result: &GenerationResult,
        update: &crate::generate::foreign_key::PendingUpdate,
    ) -> Result<()> {
        if update.values.is_empty() {
            return Ok(());
        }

        let table = self.schema.tables.get(&update.table).ok_or_else(|| {
            SeedKitError::Other(format!(
                "pending update references unknown table '{}'",
                update.table
            ))
        })?;
        let pk_columns = table
            .primary_key
            .as_ref()
            .map(|pk| pk.columns.clone())
            .unwrap_or_default();
        if pk_columns.is_empty() {
            return Err(SeedKitError::Other(format!(
                "cannot emit deferred UPDATE for '{}': table has no primary key",
                update.table
            )));
        }

        let row = &result.rows[&update.table][update.row_index];

        let set_clause: Vec<String> = update
            .columns
            .iter()
            .zip(&update.values)
            .map(|(col, val)| {
                format!(
                    "{} = {}",
                    self.quote_identifier(col),
                    val.to_sql_literal(&self.schema.database_type)
                )
            })
            .collect();

        let where_clause: Vec<String> = pk_columns
            .iter()
            .map(|col| {
                let val = row.get(col).cloned().unwrap_or(crate::generate::value::Value::Null);
                format!(
                    "{} = {}",
                    self.quote_identifier(col),
                    val.to_sql_literal(&self.schema.database_type)
                )
            })
            .collect();

        write_line(
            writer,
            &format!(
                "UPDATE {} SET {} WHERE {};",
                self.quote_identifier(&update.table),
                set_clause.join(", "),
                where_clause.join(" AND ")
            ),
        )
    }

    /// Quote an identifier per dialect: double quotes for Postgres/SQLite,
    /// backticks for MySQL. Embedded quote characters are doubled.
    fn quote_identifier(&self, name: &str) -> String {
        match self.schema.database_type {
            DatabaseType::MySQL => format!("`{}`", name.replace('`', "``")),
            DatabaseType::PostgreSQL | DatabaseType::SQLite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writeln!(writer, "{}", line).map_err(|e| SeedKitError::Output {
        message: "writing SQL script".to_string(),
        source: e,
    })
}
