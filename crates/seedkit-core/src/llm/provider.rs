//! # AI Value Provider
//!
//! [`AiValueProvider`] is the narrow trait the orchestrator's caller uses to
//! replace a column's baseline values with model-generated ones, after
//! baseline rows already exist. [`fill_ai_columns`] drives it: at most one
//! batch call per `table.column`, retried up to [`MAX_AI_RETRIES`] times,
//! falling back to the untouched baseline values on repeated failure.

use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::generate::orchestrator::GenerationResult;
use crate::generate::value::Value;
use crate::llm::client::LlmProvider;
use crate::llm::parse::parse_batch_response;
use crate::llm::prompt::batch_fill_prompt;
use crate::schema::types::DatabaseSchema;

/// Retry budget for a single column's batch-fill call before giving up and
/// keeping the baseline values the row generator already produced.
pub const MAX_AI_RETRIES: usize = 5;

/// Generates `count` distinct string values for one `table.column`.
pub trait AiValueProvider {
    async fn generate_batch(
        &self,
        context: &str,
        table: &str,
        column: &str,
        sql_type: &str,
        word_count: usize,
        count: usize,
    ) -> Result<Vec<String>>;
}

/// The default [`AiValueProvider`]: an LLM chat completion per batch.
pub struct LlmValueProvider {
    inner: LlmProvider,
}

impl LlmValueProvider {
    pub fn new(inner: LlmProvider) -> Self {
        Self { inner }
    }
}

impl AiValueProvider for LlmValueProvider {
    async fn generate_batch(
        &self,
        context: &str,
        table: &str,
        column: &str,
        sql_type: &str,
        word_count: usize,
        count: usize,
    ) -> Result<Vec<String>> {
        let prompt = batch_fill_prompt(context, table, column, sql_type, word_count, count);
        let response = self.inner.complete(&prompt).await?;
        parse_batch_response(&response)
    }
}

/// Build the compact sibling-column context a provider sees for one table.
fn table_context(schema: &DatabaseSchema, table: &str) -> String {
    match schema.tables.get(table) {
        Some(t) => format!("{}({})", table, t.columns.keys().cloned().collect::<Vec<_>>().join(", ")),
        None => table.to_string(),
    }
}

/// Approximate a reasonable target word count for a column from its
/// declared max length; falls back to a short multi-word default when the
/// column has no declared bound (e.g. `text`).
fn word_count_for(max_length: Option<u32>) -> usize {
    match max_length {
        Some(n) => ((n / 6).max(1)) as usize,
        None => 10,
    }
}

/// Replace each `table.column` in `ai_columns` with provider-generated
/// values, mutating `result` in place. Returns the values actually used,
/// keyed by `"table.column"`, for lock-file caching — entries are omitted
/// for columns where every retry failed (baseline values are left as-is).
pub async fn fill_ai_columns(
    result: &mut GenerationResult,
    schema: &DatabaseSchema,
    provider: &impl AiValueProvider,
    ai_columns: &[(String, String)],
) -> BTreeMap<String, Vec<String>> {
    let mut filled = BTreeMap::new();

    for (table, column) in ai_columns {
        let Some(rows) = result.rows.get_mut(table) else {
            continue;
        };
        let count = rows.len();
        if count == 0 {
            continue;
        }
        let Some(col) = schema
            .tables
            .get(table)
            .and_then(|t| t.columns.get(column))
        else {
            continue;
        };

        let context = table_context(schema, table);
        let word_count = word_count_for(col.max_length);

        let mut values: Option<Vec<String>> = None;
        for attempt in 0..MAX_AI_RETRIES {
            match provider
                .generate_batch(&context, table, column, &col.raw_type, word_count, count)
                .await
            {
                Ok(v) if !v.is_empty() => {
                    values = Some(v);
                    break;
                }
                Ok(_) => {
                    tracing::warn!("AI provider returned no values for {}.{} (attempt {})", table, column, attempt + 1);
                }
                Err(e) => {
                    tracing::warn!("AI batch fill failed for {}.{}: {} (attempt {})", table, column, e, attempt + 1);
                }
            }
        }

        let Some(mut values) = values else {
            tracing::warn!(
                "AI fill exhausted {} retries for {}.{}; keeping baseline values",
                MAX_AI_RETRIES,
                table,
                column
            );
            continue;
        };

        let mut seen = HashSet::new();
        values.retain(|v| seen.insert(v.clone()));
        if let Some(max_len) = col.max_length {
            for v in values.iter_mut() {
                if v.chars().count() as u32 > max_len {
                    *v = v.chars().take(max_len as usize).collect();
                }
            }
        }
        if values.is_empty() {
            continue;
        }

        for (i, row) in rows.iter_mut().enumerate() {
            let value = &values[i % values.len()];
            row.insert(column.clone(), Value::String(value.clone().into()));
        }

        filled.insert(format!("{}.{}", table, column), values);
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Column, DataType, DatabaseType, Table};
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema_with_bio_column() -> DatabaseSchema {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());
        let mut table = Table::new("users".to_string());
        table.columns.insert(
            "id".to_string(),
            Column::new("id".to_string(), DataType::Integer, "integer".to_string()),
        );
        let mut bio = Column::new("bio".to_string(), DataType::Text, "text".to_string());
        bio.max_length = Some(40);
        table.columns.insert("bio".to_string(), bio);
        schema.tables.insert("users".to_string(), table);
        schema
    }

    fn result_with_rows(n: usize) -> GenerationResult {
        let mut rows = Vec::new();
        for i in 0..n {
            let mut row: crate::generate::Row = IndexMap::new();
            row.insert("id".to_string(), Value::Int(i as i64));
            row.insert("bio".to_string(), Value::String(format!("baseline {}", i).into()));
            rows.push(row);
        }
        let mut table_rows = IndexMap::new();
        table_rows.insert("users".to_string(), rows);
        GenerationResult {
            rows: table_rows,
            pending_updates: Vec::new(),
            insertion_order: vec!["users".to_string()],
        }
    }

    struct StubProvider {
        values: Vec<String>,
        calls: AtomicUsize,
    }

    impl AiValueProvider for StubProvider {
        async fn generate_batch(
            &self,
            _context: &str,
            _table: &str,
            _column: &str,
            _sql_type: &str,
            _word_count: usize,
            _count: usize,
        ) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.values.clone())
        }
    }

    struct FailingProvider;

    impl AiValueProvider for FailingProvider {
        async fn generate_batch(
            &self,
            _context: &str,
            _table: &str,
            _column: &str,
            _sql_type: &str,
            _word_count: usize,
            _count: usize,
        ) -> Result<Vec<String>> {
            Err(crate::error::SeedKitError::LlmError {
                message: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn replaces_baseline_values_with_provider_output() {
        let schema = schema_with_bio_column();
        let mut result = result_with_rows(2);
        let provider = StubProvider {
            values: vec!["Loves hiking.".to_string(), "Coffee enthusiast.".to_string()],
            calls: AtomicUsize::new(0),
        };

        let filled = fill_ai_columns(
            &mut result,
            &schema,
            &provider,
            &[("users".to_string(), "bio".to_string())],
        )
        .await;

        let rows = &result.rows["users"];
        assert_eq!(rows[0]["bio"], Value::String("Loves hiking.".into()));
        assert_eq!(rows[1]["bio"], Value::String("Coffee enthusiast.".into()));
        assert_eq!(filled["users.bio"].len(), 2);
    }

    #[tokio::test]
    async fn keeps_baseline_values_after_retries_exhausted() {
        let schema = schema_with_bio_column();
        let mut result = result_with_rows(1);

        let filled = fill_ai_columns(
            &mut result,
            &schema,
            &FailingProvider,
            &[("users".to_string(), "bio".to_string())],
        )
        .await;

        assert_eq!(result.rows["users"][0]["bio"], Value::String("baseline 0".into()));
        assert!(filled.is_empty());
    }

    #[tokio::test]
    async fn deduplicates_and_truncates_to_max_length() {
        let schema = schema_with_bio_column();
        let mut result = result_with_rows(3);
        let long = "x".repeat(100);
        let provider = StubProvider {
            values: vec![long.clone(), long.clone(), "short".to_string()],
            calls: AtomicUsize::new(0),
        };

        let filled = fill_ai_columns(
            &mut result,
            &schema,
            &provider,
            &[("users".to_string(), "bio".to_string())],
        )
        .await;

        let values = &filled["users.bio"];
        assert_eq!(values.len(), 2, "duplicate long value should be deduplicated");
        assert!(values[0].chars().count() <= 40, "value should be truncated to max_length");
    }
}
