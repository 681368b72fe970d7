use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::collections::HashMap;

use crate::error::{Result, SeedKitError};
use crate::schema::types::{DataType, DatabaseSchema, DatabaseType};

/// Statistical distribution profile extracted from production data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionProfile {
    pub table_name: String,
    pub row_count: u64,
    pub column_distributions: HashMap<String, ColumnDistribution>,
}

/// Options controlling which tables and columns get sampled.
pub struct SampleOptions {
    /// Restrict sampling to these tables; `None` samples every table in the schema.
    pub tables: Option<Vec<String>>,
    /// Maximum number of distinct values kept for a categorical column.
    pub categorical_limit: usize,
    /// Skip tables with fewer rows than this.
    pub min_row_count: usize,
}

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::SmallInt
            | DataType::Integer
            | DataType::BigInt
            | DataType::Float
            | DataType::Double
            | DataType::Numeric
    )
}

fn is_categorical_candidate(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean | DataType::Char | DataType::VarChar | DataType::Enum(_)
    )
}

/// Connect to `db_url` and extract [`DistributionProfile`]s for the tables
/// named in `options` (or every table in `schema` when unset).
///
/// Skips tables below `options.min_row_count`. Numeric columns get a
/// `min`/`max`/`mean`/`stddev` aggregate; low-cardinality string and boolean
/// columns get a value-frequency histogram capped at `options.categorical_limit`
/// entries; every foreign key gets a row-count ratio against its parent table.
/// Text/JSON/binary/temporal/UUID columns are skipped — they carry too much
/// entropy (or too much PII risk) for a coarse distribution to help.
pub async fn extract_distributions(
    db_url: &str,
    schema: &DatabaseSchema,
    options: &SampleOptions,
) -> Result<Vec<DistributionProfile>> {
    match schema.database_type {
        DatabaseType::PostgreSQL => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .map_err(|e| SeedKitError::Connection {
                    message: "Failed to connect for sampling".to_string(),
                    connection_hint: db_url.to_string(),
                    source: e,
                })?;
            extract_with(&pool, schema, options, Dialect::Postgres).await
        }
        DatabaseType::MySQL => {
            let pool = sqlx::mysql::MySqlPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .map_err(|e| SeedKitError::Connection {
                    message: "Failed to connect for sampling".to_string(),
                    connection_hint: db_url.to_string(),
                    source: e,
                })?;
            extract_with(&pool, schema, options, Dialect::MySql).await
        }
        DatabaseType::SQLite => {
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(1)
                .connect(db_url)
                .await
                .map_err(|e| SeedKitError::Connection {
                    message: "Failed to connect for sampling".to_string(),
                    connection_hint: db_url.to_string(),
                    source: e,
                })?;
            extract_with(&pool, schema, options, Dialect::Sqlite).await
        }
    }
}

#[derive(Clone, Copy)]
enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{ident}`"),
            _ => format!("\"{ident}\""),
        }
    }

    fn cast_double(&self, expr: &str) -> String {
        match self {
            Dialect::Postgres => format!("CAST({expr} AS DOUBLE PRECISION)"),
            Dialect::MySql => format!("CAST({expr} AS DOUBLE)"),
            Dialect::Sqlite => format!("CAST({expr} AS REAL)"),
        }
    }

    fn cast_text(&self, expr: &str) -> String {
        match self {
            Dialect::MySql => format!("CAST({expr} AS CHAR)"),
            _ => format!("CAST({expr} AS TEXT)"),
        }
    }
}

async fn extract_with<DB>(
    pool: &sqlx::Pool<DB>,
    schema: &DatabaseSchema,
    options: &SampleOptions,
    dialect: Dialect,
) -> Result<Vec<DistributionProfile>>
where
    DB: sqlx::Database,
    i64: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    f64: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    String: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    for<'q> <DB as sqlx::Database>::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c mut <DB as sqlx::Database>::Connection: sqlx::Executor<'c, Database = DB>,
    for<'r> &'r str: sqlx::ColumnIndex<<DB as sqlx::Database>::Row>,
{
    let mut profiles = Vec::new();

    for (table_name, table) in &schema.tables {
        if let Some(ref wanted) = options.tables {
            if !wanted.iter().any(|t| t == table_name) {
                continue;
            }
        }

        let row_count = fetch_row_count(pool, dialect, table_name).await?;
        if (row_count as usize) < options.min_row_count {
            continue;
        }

        let mut column_distributions = HashMap::new();

        for (col_name, column) in &table.columns {
            if is_numeric(&column.data_type) {
                if let Some(dist) =
                    fetch_numeric_distribution(pool, dialect, table_name, col_name).await?
                {
                    column_distributions.insert(col_name.clone(), dist);
                }
            } else if is_categorical_candidate(&column.data_type) {
                if let Some(dist) = fetch_categorical_distribution(
                    pool,
                    dialect,
                    table_name,
                    col_name,
                    row_count,
                    options.categorical_limit,
                )
                .await?
                {
                    column_distributions.insert(col_name.clone(), dist);
                }
            }
        }

        for fk in &table.foreign_keys {
            let parent_count = fetch_row_count(pool, dialect, &fk.referenced_table).await?;
            if parent_count > 0 {
                let key = format!("__ratio_{}", fk.source_columns.join("_"));
                column_distributions.insert(
                    key,
                    ColumnDistribution::Ratio {
                        related_table: fk.referenced_table.clone(),
                        ratio: row_count as f64 / parent_count as f64,
                    },
                );
            }
        }

        profiles.push(DistributionProfile {
            table_name: table_name.clone(),
            row_count,
            column_distributions,
        });
    }

    Ok(profiles)
}

async fn fetch_row_count<DB>(pool: &sqlx::Pool<DB>, dialect: Dialect, table: &str) -> Result<u64>
where
    DB: sqlx::Database,
    i64: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    for<'q> <DB as sqlx::Database>::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c mut <DB as sqlx::Database>::Connection: sqlx::Executor<'c, Database = DB>,
    for<'r> &'r str: sqlx::ColumnIndex<<DB as sqlx::Database>::Row>,
{
    let query = format!("SELECT COUNT(*) AS n FROM {}", dialect.quote(table));
    let row = sqlx::query(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| SeedKitError::Introspection {
            query: query.clone(),
            source: e,
        })?;
    let n: i64 = row
        .try_get("n")
        .map_err(|e| SeedKitError::Introspection { query, source: e })?;
    Ok(n.max(0) as u64)
}

/// `mean`/`stddev` come from `AVG(col)` and `AVG(col*col)` in one pass —
/// `sqrt(E[x^2] - E[x]^2)` — so every backend can compute this with plain
/// aggregates instead of a dialect-specific `STDDEV_POP`.
async fn fetch_numeric_distribution<DB>(
    pool: &sqlx::Pool<DB>,
    dialect: Dialect,
    table: &str,
    column: &str,
) -> Result<Option<ColumnDistribution>>
where
    DB: sqlx::Database,
    f64: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    for<'q> <DB as sqlx::Database>::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c mut <DB as sqlx::Database>::Connection: sqlx::Executor<'c, Database = DB>,
    for<'r> &'r str: sqlx::ColumnIndex<<DB as sqlx::Database>::Row>,
{
    let col = dialect.quote(column);
    let query = format!(
        "SELECT {lo} AS lo, {hi} AS hi, {av} AS av, {sq} AS sq FROM {tbl} WHERE {col} IS NOT NULL",
        lo = dialect.cast_double(&format!("MIN({col})")),
        hi = dialect.cast_double(&format!("MAX({col})")),
        av = dialect.cast_double(&format!("AVG({col})")),
        sq = dialect.cast_double(&format!("AVG({col} * {col})")),
        tbl = dialect.quote(table),
        col = col,
    );
    let row = sqlx::query(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| SeedKitError::Introspection {
            query: query.clone(),
            source: e,
        })?;
    let err = |e: sqlx::Error| SeedKitError::Introspection {
        query: query.clone(),
        source: e,
    };
    let lo: Option<f64> = row.try_get("lo").map_err(err)?;
    let hi: Option<f64> = row.try_get("hi").map_err(err)?;
    let av: Option<f64> = row.try_get("av").map_err(err)?;
    let sq: Option<f64> = row.try_get("sq").map_err(err)?;

    match (lo, hi, av, sq) {
        (Some(min), Some(max), Some(mean), Some(mean_sq)) => {
            let variance = (mean_sq - mean * mean).max(0.0);
            Ok(Some(ColumnDistribution::Numeric {
                min,
                max,
                mean,
                stddev: variance.sqrt(),
            }))
        }
        _ => Ok(None),
    }
}

async fn fetch_categorical_distribution<DB>(
    pool: &sqlx::Pool<DB>,
    dialect: Dialect,
    table: &str,
    column: &str,
    row_count: u64,
    limit: usize,
) -> Result<Option<ColumnDistribution>>
where
    DB: sqlx::Database,
    i64: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    String: sqlx::Type<DB> + for<'r> sqlx::Decode<'r, DB>,
    for<'q> <DB as sqlx::Database>::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c mut <DB as sqlx::Database>::Connection: sqlx::Executor<'c, Database = DB>,
    for<'r> &'r str: sqlx::ColumnIndex<<DB as sqlx::Database>::Row>,
{
    let col = dialect.quote(column);
    let query = format!(
        "SELECT {val} AS v, COUNT(*) AS c FROM {tbl} WHERE {col} IS NOT NULL GROUP BY {col} ORDER BY c DESC LIMIT {limit}",
        val = dialect.cast_text(&col),
        tbl = dialect.quote(table),
        col = col,
        limit = limit,
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .map_err(|e| SeedKitError::Introspection {
            query: query.clone(),
            source: e,
        })?;
    if rows.is_empty() {
        return Ok(None);
    }

    let denom = row_count.max(1) as f64;
    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        let err = |e: sqlx::Error| SeedKitError::Introspection {
            query: query.clone(),
            source: e,
        };
        let v: String = row.try_get("v").map_err(err)?;
        let c: i64 = row.try_get("c").map_err(err)?;
        values.push((v, c as f64 / denom));
    }
    Ok(Some(ColumnDistribution::Categorical { values }))
}

/// Distribution information for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColumnDistribution {
    /// Categorical distribution (enum-like values with frequencies).
    Categorical {
        values: Vec<(String, f64)>, // (value, frequency)
    },
    /// Numeric distribution.
    Numeric {
        min: f64,
        max: f64,
        mean: f64,
        stddev: f64,
    },
    /// Ratio to another table's row count.
    Ratio {
        related_table: String,
        ratio: f64, // e.g., 3.2 orders per user
    },
}
