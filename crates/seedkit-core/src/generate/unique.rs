use std::collections::{HashMap, HashSet};

use crate::generate::value::Value;

/// Remembers every value (or value tuple) handed out for each registered
/// unique constraint, so the row generator can reject a collision and retry
/// instead of silently emitting a duplicate key.
pub struct UniqueTracker {
    /// Keyed by `table:col1,col2,...`, holding the set of combos already seen.
    constraints: HashMap<String, HashSet<String>>,
    /// Retry budget handed to callers before they give up on a row.
    pub max_retries: usize,
}

impl UniqueTracker {
    pub fn new() -> Self {
        Self {
            constraints: HashMap::new(),
            max_retries: 1000,
        }
    }

    /// Register a unique constraint to track.
    pub fn register_constraint(&mut self, table_name: &str, columns: &[String]) {
        let key = constraint_key(table_name, columns);
        self.constraints.entry(key).or_default();
    }

    /// Check if a value (or composite value) has been seen before.
    /// If not, record it and return true. If duplicate, return false.
    pub fn try_insert(&mut self, table_name: &str, columns: &[String], values: &[&Value]) -> bool {
        let key = constraint_key(table_name, columns);

        if let Some(seen) = self.constraints.get_mut(&key) {
            let value_key = values
                .iter()
                .map(|v| v.to_unique_key())
                .collect::<Vec<_>>()
                .join("|");

            seen.insert(value_key)
        } else {
            // Constraint not registered, allow anything
            true
        }
    }

    /// Check if a single-column value is unique.
    pub fn try_insert_single(
        &mut self,
        table_name: &str,
        column_name: &str,
        value: &Value,
    ) -> bool {
        self.try_insert(table_name, &[column_name.to_string()], &[value])
    }

    /// Get the number of unique values tracked for a constraint.
    pub fn count(&self, table_name: &str, columns: &[String]) -> usize {
        let key = constraint_key(table_name, columns);
        self.constraints.get(&key).map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for UniqueTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn constraint_key(table_name: &str, columns: &[String]) -> String {
    format!("{}:{}", table_name, columns.join(","))
}
