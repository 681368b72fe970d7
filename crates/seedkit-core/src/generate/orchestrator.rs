//! # Orchestrator
//!
//! Drives a full generation run: applies `pkUuidOverrides` to the schema,
//! computes a cycle-tolerant insertion order, then generates each table's
//! rows in that order so FK references always have a populated (or at least
//! already-attempted) parent pool to draw from. A final pass patches in any
//! [`PendingUpdate`]s left by FK edges that closed a dependency cycle.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::error::{Result, SeedKitError};
use crate::generate::foreign_key::{ForeignKeyOutcome, ForeignKeyResolver, PendingUpdate};
use crate::generate::row_generator::RowGenerator;
use crate::generate::value::Value;
use crate::generate::value_generator::{DictionaryOptions, ValueGenerator};
use crate::generate::Row;
use crate::graph::dag::DependencyGraph;
use crate::graph::topo::topological_sort;
use crate::schema::types::DatabaseSchema;

/// A block of rows sharing fixed/constant column values, generated ahead of
/// the general fill phase (e.g. "always seed these 3 admin roles first").
#[derive(Debug, Clone, Default)]
pub struct RepetitionRule {
    pub count: usize,
    pub fixed_values: IndexMap<String, Value>,
    pub random_constant_columns: Vec<String>,
}

/// Everything that shapes one generation run.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub rows_per_table: HashMap<String, usize>,
    pub default_rows: usize,
    /// When true, FK edges that close a cycle are nulled and patched in a
    /// second pass instead of failing outright.
    pub deferred: bool,
    /// `"table.column"` entries to treat as UUID-identity columns even when
    /// the declared type isn't `uuid`.
    pub pk_uuid_overrides: Vec<String>,
    pub excluded_columns: HashMap<String, Vec<String>>,
    pub repetition_rules: HashMap<String, Vec<RepetitionRule>>,
    /// `table -> column` for soft-delete columns to populate after the row
    /// is otherwise complete.
    pub soft_delete_columns: HashMap<String, String>,
    pub soft_delete_use_schema_default: bool,
    pub soft_delete_value: Option<Value>,
    pub numeric_scale: u32,
    pub dictionaries: DictionaryOptions,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            rows_per_table: HashMap::new(),
            default_rows: 100,
            deferred: false,
            pk_uuid_overrides: Vec::new(),
            excluded_columns: HashMap::new(),
            repetition_rules: HashMap::new(),
            soft_delete_columns: HashMap::new(),
            soft_delete_use_schema_default: false,
            soft_delete_value: None,
            numeric_scale: 2,
            dictionaries: DictionaryOptions::default(),
            seed: None,
        }
    }
}

/// The output of a generation run: every table's rows plus any FK columns
/// patched in after the fact, in the order tables were inserted.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub rows: IndexMap<String, Vec<Row>>,
    pub pending_updates: Vec<PendingUpdate>,
    pub insertion_order: Vec<String>,
}

pub struct Orchestrator;

impl Orchestrator {
    pub fn generate(schema: &DatabaseSchema, config: &GenerationConfig) -> Result<GenerationResult> {
        if schema.tables.is_empty() {
            return Err(SeedKitError::NullSchema);
        }

        let mut schema = schema.clone();
        apply_pk_uuid_overrides(&mut schema, &config.pk_uuid_overrides);

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph)?;
        let deferred = config.deferred || order.requires_deferred_due_to_non_nullable_cycles();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut used_uuids: HashSet<Uuid> = HashSet::new();
        let mut resolver = ForeignKeyResolver::new();
        let mut result_rows: IndexMap<String, Vec<Row>> = IndexMap::new();
        let mut pending_updates = Vec::new();

        for table_name in &order.tables {
            let table = &schema.tables[table_name];
            let target_rows = config
                .rows_per_table
                .get(table_name)
                .copied()
                .unwrap_or(config.default_rows);
            let excluded = config
                .excluded_columns
                .get(table_name)
                .cloned()
                .unwrap_or_default();
            let repetition = config
                .repetition_rules
                .get(table_name)
                .cloned()
                .unwrap_or_default();

            let generator = RowGenerator::new(table, &excluded);
            let (mut rows, pending) = generator.generate(
                table_name,
                target_rows,
                &repetition,
                config.dictionaries,
                config.numeric_scale,
                &mut used_uuids,
                &mut resolver,
                deferred,
                &mut rng,
            )?;

            if let Some(col_name) = config.soft_delete_columns.get(table_name) {
                if let Some(column) = table.columns.get(col_name) {
                    let mut value_gen =
                        ValueGenerator::new(config.dictionaries, config.numeric_scale, &mut used_uuids);
                    for (i, row) in rows.iter_mut().enumerate() {
                        let value = value_gen.generate_soft_delete_value(
                            table_name,
                            column,
                            config.soft_delete_use_schema_default,
                            config.soft_delete_value.as_ref(),
                            i,
                            &mut rng,
                        )?;
                        row.insert(col_name.clone(), value);
                    }
                }
            }

            resolver.record_table_rows(table_name, rows.clone());
            result_rows.insert(table_name.clone(), rows);
            pending_updates.extend(pending);
        }

        for update in pending_updates.iter_mut() {
            let fk_key = update
                .fk
                .name
                .clone()
                .unwrap_or_else(|| update.fk.source_columns.join(","));
            let outcome =
                resolver.resolve(&update.table, &update.fk, &fk_key, true, 0, false, &mut rng)?;
            if let ForeignKeyOutcome::Values(values) = outcome {
                update.values = values;
            }
        }

        Ok(GenerationResult {
            rows: result_rows,
            pending_updates,
            insertion_order: order.tables,
        })
    }
}

fn apply_pk_uuid_overrides(schema: &mut DatabaseSchema, overrides: &[String]) {
    use crate::schema::types::DataType;

    for entry in overrides {
        let Some((table_name, column_name)) = entry.split_once('.') else {
            continue;
        };
        if let Some(table) = schema.tables.get_mut(table_name) {
            if let Some(column) = table.columns.get_mut(column_name) {
                column.is_uuid = true;
                // A column promoted to UUID identity renders as Value::Uuid
                // regardless of its declared type, so downstream code that
                // still dispatches on `data_type` (hashing, CSV/JSON export,
                // dialect literal formatting) needs a string-ish type here
                // if it isn't one already.
                if !matches!(
                    column.data_type,
                    DataType::Uuid | DataType::Char | DataType::VarChar | DataType::Text
                ) {
                    column.data_type = DataType::VarChar;
                }
            }
        }
    }
}
