//! Row generation: turning a [`DatabaseSchema`](crate::schema::types::DatabaseSchema)
//! plus a [`GenerationConfig`](orchestrator::GenerationConfig) into in-memory rows.

pub mod foreign_key;
pub mod orchestrator;
pub mod row_generator;
pub mod unique;
pub mod value;
pub mod value_generator;

use indexmap::IndexMap;

use crate::generate::value::Value;

/// A single generated row: column name to value, in column declaration order.
pub type Row = IndexMap<String, Value>;
