//! # Foreign Key Resolver
//!
//! Tracks generated rows per table so child tables can pick valid references.
//! As parent tables finish generating (topological order), their rows are
//! recorded here via [`ForeignKeyResolver::record_table_rows`]. Child columns
//! then resolve through [`ForeignKeyResolver::resolve`], which distinguishes
//! three shapes of reference:
//!
//! - a plain many-to-one FK: sample a random parent row.
//! - a `unique_on_fk` FK (the 1:1 case): hand out parent rows from a
//!   per-table shuffled queue, one per child row, so no parent is reused.
//! - a reference into a table that hasn't been generated yet (the edge
//!   closes a dependency cycle): null the column now and, in deferred mode,
//!   return a pending update to patch in a second pass.

use std::collections::{HashMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, SeedKitError};
use crate::generate::value::Value;
use crate::generate::Row;
use crate::schema::types::ForeignKey;

/// An FK column that couldn't be resolved yet because its parent table
/// hasn't finished generating (a cycle edge in deferred mode). Recorded so
/// the orchestrator can patch it in after every table has rows.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub table: String,
    pub row_index: usize,
    pub columns: Vec<String>,
    pub fk: ForeignKey,
    /// Resolved `columns` values, filled in by the orchestrator's final
    /// pass once every table has rows. Empty until then.
    pub values: Vec<Value>,
}

/// What resolving one FK for one row produced.
pub enum ForeignKeyOutcome {
    /// Concrete values for `fk.source_columns`, in order.
    Values(Vec<Value>),
    /// The parent table doesn't exist yet; caller should null the FK columns
    /// and record a [`PendingUpdate`].
    Deferred,
}

pub struct ForeignKeyResolver {
    parent_rows: HashMap<String, Vec<Row>>,
    unique_queues: HashMap<String, VecDeque<usize>>,
}

impl ForeignKeyResolver {
    pub fn new() -> Self {
        Self {
            parent_rows: HashMap::new(),
            unique_queues: HashMap::new(),
        }
    }

    /// Record the fully generated rows of `table_name` so later tables can
    /// reference them.
    pub fn record_table_rows(&mut self, table_name: &str, rows: Vec<Row>) {
        self.parent_rows.insert(table_name.to_string(), rows);
    }

    pub fn has_table(&self, table_name: &str) -> bool {
        self.parent_rows.contains_key(table_name)
    }

    pub fn row_count(&self, table_name: &str) -> usize {
        self.parent_rows.get(table_name).map(Vec::len).unwrap_or(0)
    }

    /// Resolve one FK reference for one child row.
    ///
    /// `fk_key` disambiguates multiple FKs on the same child table (the
    /// constraint name if present, else the joined source column names) so
    /// each gets its own unique-assignment queue.
    pub fn resolve(
        &mut self,
        child_table: &str,
        fk: &ForeignKey,
        fk_key: &str,
        nullable: bool,
        child_total_rows: usize,
        deferred: bool,
        rng: &mut impl Rng,
    ) -> Result<ForeignKeyOutcome> {
        let parent_exists = self.parent_rows.contains_key(&fk.referenced_table);

        if !parent_exists {
            if !deferred && !nullable {
                return Err(SeedKitError::NonNullableFkInCycle {
                    table: child_table.to_string(),
                    column: fk.source_columns.join(","),
                    parent_table: fk.referenced_table.clone(),
                });
            }
            // Either deferred mode is on, or the column is nullable and can
            // be nulled now with a pending patch recorded for later — both
            // cases defer to the caller, which nulls the column and records
            // a `PendingUpdate` for the orchestrator's final pass.
            return Ok(ForeignKeyOutcome::Deferred);
        }

        let parent_len = self.parent_rows[&fk.referenced_table].len();
        if parent_len == 0 {
            if nullable {
                return Ok(ForeignKeyOutcome::Values(nulls(fk)));
            }
            return Err(SeedKitError::ForeignKeyResolution {
                source_table: child_table.to_string(),
                source_column: fk.source_columns.join(","),
                target_table: fk.referenced_table.clone(),
                target_column: fk.referenced_columns.join(","),
            });
        }

        if fk.unique_on_fk {
            let key = format!("{}::{}", child_table, fk_key);
            if !self.unique_queues.contains_key(&key) {
                if child_total_rows > parent_len && !nullable {
                    return Err(SeedKitError::UniqueFkInsufficientParents {
                        child_table: child_table.to_string(),
                        fk_name: fk_key.to_string(),
                        parent_table: fk.referenced_table.clone(),
                        parent_rows: parent_len,
                        child_rows: child_total_rows,
                    });
                }
                let mut indices: Vec<usize> = (0..parent_len).collect();
                indices.shuffle(rng);
                self.unique_queues.insert(key.clone(), indices.into());
            }

            let queue = self.unique_queues.get_mut(&key).unwrap();
            return match queue.pop_front() {
                Some(idx) => {
                    let row = &self.parent_rows[&fk.referenced_table][idx];
                    Ok(ForeignKeyOutcome::Values(extract(row, &fk.referenced_columns)))
                }
                None if nullable => Ok(ForeignKeyOutcome::Values(nulls(fk))),
                None => Err(SeedKitError::UniqueFkInsufficientParents {
                    child_table: child_table.to_string(),
                    fk_name: fk_key.to_string(),
                    parent_table: fk.referenced_table.clone(),
                    parent_rows: parent_len,
                    child_rows: child_total_rows,
                }),
            };
        }

        let idx = rng.random_range(0..parent_len);
        let row = &self.parent_rows[&fk.referenced_table][idx];
        Ok(ForeignKeyOutcome::Values(extract(row, &fk.referenced_columns)))
    }
}

impl Default for ForeignKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn nulls(fk: &ForeignKey) -> Vec<Value> {
    vec![Value::Null; fk.source_columns.len()]
}

fn extract(row: &Row, columns: &[String]) -> Vec<Value> {
    columns
        .iter()
        .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
        .collect()
}
