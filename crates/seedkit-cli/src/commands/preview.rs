use anyhow::{Context, Result};
use comfy_table::Table as ComfyTable;

use seedkit_core::schema::introspect::{database_type_from_url, SchemaIntrospector};
use seedkit_core::schema::types::DatabaseType;
use seedkit_core::{GenerationConfig, Orchestrator};

use crate::args::PreviewArgs;

pub async fn run(args: &PreviewArgs) -> Result<()> {
    let db_url = args
        .db
        .as_deref()
        .ok_or_else(|| seedkit_core::error::SeedKitError::NoDatabaseUrl)?;

    let db_type = database_type_from_url(db_url)?;

    let schema = match db_type {
        DatabaseType::PostgreSQL => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let introspector = match args.schema.as_deref() {
                Some(name) => seedkit_core::schema::postgres::PostgresIntrospector::with_schema(
                    pool,
                    name.to_string(),
                ),
                None => seedkit_core::schema::postgres::PostgresIntrospector::new(pool),
            };
            introspector.introspect().await?
        }
        DatabaseType::MySQL => {
            let pool = sqlx::mysql::MySqlPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("Failed to connect to MySQL")?;
            let db_name = args.schema.clone().unwrap_or_else(|| {
                db_url
                    .rsplit('/')
                    .next()
                    .unwrap_or("mysql")
                    .split('?')
                    .next()
                    .unwrap_or("mysql")
                    .to_string()
            });
            let introspector = seedkit_core::schema::mysql::MySqlIntrospector::new(pool, db_name);
            introspector.introspect().await?
        }
        DatabaseType::SQLite => {
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(1)
                .connect(db_url)
                .await
                .context("Failed to connect to SQLite")?;
            let introspector = seedkit_core::schema::sqlite::SqliteIntrospector::new(pool);
            introspector.introspect().await?
        }
    };

    // Fixed seed so repeated previews of the same schema look the same.
    let config = GenerationConfig {
        default_rows: args.rows,
        seed: Some(42),
        ..Default::default()
    };
    let result = Orchestrator::generate(&schema, &config)?;

    for table_name in &result.insertion_order {
        let rows = &result.rows[table_name];
        if rows.is_empty() {
            continue;
        }

        println!("=== {} ({} rows) ===", table_name, rows.len());

        let columns: Vec<&String> = rows[0].keys().collect();

        let mut t = ComfyTable::new();
        t.set_header(columns.iter().map(|c| c.as_str()).collect::<Vec<_>>());

        for row in rows {
            let values: Vec<String> = columns
                .iter()
                .map(|col| {
                    row.get(*col)
                        .map(|v| {
                            let s = format!("{}", v);
                            if s.len() > 40 {
                                format!("{}...", &s[..37])
                            } else {
                                s
                            }
                        })
                        .unwrap_or_else(|| "NULL".to_string())
                })
                .collect();
            t.add_row(values);
        }

        println!("{}\n", t);
    }

    Ok(())
}
