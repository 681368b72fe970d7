//! # Row Generator
//!
//! Generates rows for a single table: applies multi-column CHECK
//! combinations first, fills the remaining columns (resolving FK references
//! and per-column CHECK bounds along the way), then gates the row on primary
//! key / unique constraint uniqueness before accepting it.
//!
//! Two budgets bound the work: [`MAX_GENERATE_ATTEMPTS`] per row coming from
//! a repetition rule (a row that can't be made to satisfy its constraints
//! after that many tries is silently dropped, not fatal), and
//! `rows_needed * MAX_GENERATE_ATTEMPTS` total attempts for the fill phase.

use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;
use uuid::Uuid;

use crate::constraint::{ConstraintParser, MultiColumnConstraint, ParsedConstraint};
use crate::error::Result;
use crate::generate::foreign_key::{ForeignKeyOutcome, ForeignKeyResolver, PendingUpdate};
use crate::generate::orchestrator::RepetitionRule;
use crate::generate::unique::UniqueTracker;
use crate::generate::value::Value;
use crate::generate::value_generator::{DictionaryOptions, ValueGenerator};
use crate::generate::Row;
use crate::schema::types::{ForeignKey, Table};

/// Attempts allowed to make a single row satisfy its constraints before it
/// is dropped (repetition rows) or the fill phase gives up on that slot.
pub const MAX_GENERATE_ATTEMPTS: usize = 100;

/// Probability a nullable column is set to NULL rather than filled.
const NULL_PROBABILITY: f64 = 0.3;

pub struct RowGenerator<'a> {
    table: &'a Table,
    parsed: HashMap<String, ParsedConstraint>,
    multi_column: Vec<MultiColumnConstraint>,
    fk_by_column: HashMap<String, &'a ForeignKey>,
    excluded_columns: HashSet<String>,
    unique_keys: Vec<Vec<String>>,
}

impl<'a> RowGenerator<'a> {
    pub fn new(table: &'a Table, excluded_columns: &[String]) -> Self {
        let mut parsed = HashMap::new();
        for (name, column) in &table.columns {
            parsed.insert(
                name.clone(),
                ConstraintParser::parse_column(name, &table.check_constraints, column.max_length),
            );
        }
        let multi_column = ConstraintParser::parse_multi_column(&table.check_constraints);

        let mut fk_by_column = HashMap::new();
        for fk in &table.foreign_keys {
            if fk.source_columns.len() == 1 {
                fk_by_column.insert(fk.source_columns[0].clone(), fk);
            }
        }

        let mut unique_keys = Vec::new();
        if let Some(pk) = &table.primary_key {
            unique_keys.push(pk.columns.clone());
        }
        for uc in &table.unique_constraints {
            unique_keys.push(uc.columns.clone());
        }

        Self {
            table,
            parsed,
            multi_column,
            fk_by_column,
            excluded_columns: excluded_columns.iter().cloned().collect(),
            unique_keys,
        }
    }

    /// Generate up to `target_rows` rows for this table.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &self,
        table_name: &str,
        target_rows: usize,
        repetition_rules: &[RepetitionRule],
        dictionaries: DictionaryOptions,
        numeric_scale: u32,
        used_uuids: &mut HashSet<Uuid>,
        fk_resolver: &mut ForeignKeyResolver,
        deferred: bool,
        rng: &mut impl Rng,
    ) -> Result<(Vec<Row>, Vec<PendingUpdate>)> {
        let mut tracker = UniqueTracker::new();
        for key in &self.unique_keys {
            tracker.register_constraint(table_name, key);
        }
        let mut value_gen = ValueGenerator::new(dictionaries, numeric_scale, used_uuids);
        let mut rows = Vec::new();
        let mut pending = Vec::new();

        for rule in repetition_rules {
            let mut constants: Row = IndexMap::new();
            for col_name in &rule.random_constant_columns {
                if let Some(column) = self.table.columns.get(col_name) {
                    let parsed = self.parsed.get(col_name).cloned().unwrap_or_default();
                    let v = value_gen.generate(table_name, column, &parsed, rows.len(), rng)?;
                    constants.insert(col_name.clone(), v);
                }
            }

            for _ in 0..rule.count {
                let mut base = constants.clone();
                for (col, val) in &rule.fixed_values {
                    base.insert(col.clone(), val.clone());
                }
                let row_index = rows.len();
                let mut accepted = None;
                for _ in 0..MAX_GENERATE_ATTEMPTS {
                    if let Some(row) = self.attempt_one_row(
                        table_name,
                        base.clone(),
                        row_index,
                        target_rows,
                        &mut value_gen,
                        fk_resolver,
                        deferred,
                        &mut tracker,
                        &mut pending,
                        rng,
                    )? {
                        accepted = Some(row);
                        break;
                    }
                }
                if let Some(row) = accepted {
                    rows.push(row);
                }
                // else: silently dropped, budget exhausted
            }
        }

        let fill_budget = target_rows.saturating_mul(MAX_GENERATE_ATTEMPTS);
        let mut attempts = 0;
        while rows.len() < target_rows && attempts < fill_budget {
            attempts += 1;
            let row_index = rows.len();
            if let Some(row) = self.attempt_one_row(
                table_name,
                IndexMap::new(),
                row_index,
                target_rows,
                &mut value_gen,
                fk_resolver,
                deferred,
                &mut tracker,
                &mut pending,
                rng,
            )? {
                rows.push(row);
            }
        }

        Ok((rows, pending))
    }

    #[allow(clippy::too_many_arguments)]
    fn attempt_one_row(
        &self,
        table_name: &str,
        base: Row,
        row_index: usize,
        total_rows: usize,
        value_gen: &mut ValueGenerator,
        fk_resolver: &mut ForeignKeyResolver,
        deferred: bool,
        tracker: &mut UniqueTracker,
        pending: &mut Vec<PendingUpdate>,
        rng: &mut impl Rng,
    ) -> Result<Option<Row>> {
        let mut row = base;
        let preset: HashSet<String> = row.keys().cloned().collect();

        for mc in &self.multi_column {
            let compatible = compatible_combinations(mc, &row);
            if compatible.is_empty() {
                // No combination agrees with the already-preset columns;
                // leave the rest of `mc.columns` to the generic fill below
                // and let the reconciliation pass repair it afterward.
                continue;
            }
            let combo = compatible[rng.random_range(0..compatible.len())];
            apply_combination(combo, &mut row);
        }

        for (name, column) in &self.table.columns {
            if row.contains_key(name) || self.excluded_columns.contains(name) {
                continue;
            }

            if let Some(fk) = self.fk_by_column.get(name) {
                let fk_key = fk
                    .name
                    .clone()
                    .unwrap_or_else(|| fk.source_columns.join(","));
                match fk_resolver.resolve(
                    table_name,
                    fk,
                    &fk_key,
                    column.nullable,
                    total_rows,
                    deferred,
                    rng,
                )? {
                    ForeignKeyOutcome::Values(mut values) => {
                        row.insert(name.clone(), values.pop().unwrap_or(Value::Null));
                    }
                    ForeignKeyOutcome::Deferred => {
                        row.insert(name.clone(), Value::Null);
                        pending.push(PendingUpdate {
                            table: table_name.to_string(),
                            row_index,
                            columns: fk.source_columns.clone(),
                            fk: (*fk).clone(),
                            values: Vec::new(),
                        });
                    }
                }
                continue;
            }

            if column.nullable && rng.random_bool(NULL_PROBABILITY) {
                row.insert(name.clone(), Value::Null);
                continue;
            }

            let parsed = self.parsed.get(name).cloned().unwrap_or_default();
            let value = value_gen.generate(table_name, column, &parsed, row_index, rng)?;
            row.insert(name.clone(), value);
        }

        self.reconcile_multi_column_constraints(&mut row, &preset, rng);

        for key_cols in &self.unique_keys {
            let values: Vec<&Value> = key_cols.iter().map(|c| row.get(c).unwrap_or(&Value::Null)).collect();
            if !tracker.try_insert(table_name, key_cols, &values) {
                return Ok(None);
            }
        }

        Ok(Some(row))
    }

    /// Re-check every multi-column constraint once the rest of the row is
    /// filled, repairing any combination that drifted out of agreement
    /// (e.g. its columns were filled independently because no combination
    /// was compatible with a preset value at the time). Columns present in
    /// `preset` are never overwritten; only the generator-filled ones are.
    fn reconcile_multi_column_constraints(&self, row: &mut Row, preset: &HashSet<String>, rng: &mut impl Rng) {
        for mc in &self.multi_column {
            if combination_satisfied(mc, row) {
                continue;
            }
            let compatible = compatible_combinations_ignoring(mc, row, preset);
            if compatible.is_empty() {
                continue;
            }
            let combo = compatible[rng.random_range(0..compatible.len())];
            for (col, val) in combo {
                if preset.contains(col) {
                    continue;
                }
                row.insert(col.clone(), combo_value(val));
            }
        }
    }
}

/// Combinations of `mc` compatible with whatever `mc.columns` already hold
/// in `row` (used before the generic fill phase, when only preset/repetition
/// values are in place).
fn compatible_combinations<'a>(
    mc: &'a MultiColumnConstraint,
    row: &Row,
) -> Vec<&'a IndexMap<String, String>> {
    mc.allowed_combinations
        .iter()
        .filter(|combo| {
            mc.columns.iter().all(|c| match row.get(c) {
                Some(v) => combo.get(c).is_some_and(|val| combo_matches(val, v)),
                None => true,
            })
        })
        .collect()
}

/// Like [`compatible_combinations`], but only checks agreement on columns in
/// `preset` — used during reconciliation so a combination is accepted as
/// long as it doesn't contradict a caller-fixed value, even if the
/// generator already filled the other columns with something incompatible.
fn compatible_combinations_ignoring<'a>(
    mc: &'a MultiColumnConstraint,
    row: &Row,
    preset: &HashSet<String>,
) -> Vec<&'a IndexMap<String, String>> {
    mc.allowed_combinations
        .iter()
        .filter(|combo| {
            mc.columns.iter().all(|c| {
                if !preset.contains(c) {
                    return true;
                }
                match row.get(c) {
                    Some(v) => combo.get(c).is_some_and(|val| combo_matches(val, v)),
                    None => true,
                }
            })
        })
        .collect()
}

fn combination_satisfied(mc: &MultiColumnConstraint, row: &Row) -> bool {
    mc.allowed_combinations.iter().any(|combo| {
        mc.columns
            .iter()
            .all(|c| row.get(c).is_some_and(|v| combo.get(c).is_some_and(|val| combo_matches(val, v))))
    })
}

fn apply_combination(combo: &IndexMap<String, String>, row: &mut Row) {
    for (col, val) in combo {
        row.entry(col.clone()).or_insert_with(|| combo_value(val));
    }
}

fn combo_value(val: &str) -> Value {
    if val == "NULL" {
        Value::Null
    } else {
        Value::String(val.to_string().into())
    }
}

fn combo_matches(combo_val: &str, actual: &Value) -> bool {
    actual.to_unique_key() == combo_val
}
