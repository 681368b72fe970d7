use anyhow::{Context, Result};

use seedkit_core::graph::dag::DependencyGraph;
use seedkit_core::graph::topo::topological_sort;
use seedkit_core::graph::visualize::{self, GraphFormat as VizFormat};
use seedkit_core::schema::introspect::{database_type_from_url, SchemaIntrospector};
use seedkit_core::schema::types::DatabaseType;

use crate::args::GraphArgs;

pub async fn run(args: &GraphArgs) -> Result<()> {
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

    let dep_graph = DependencyGraph::from_schema(&schema);
    let order = topological_sort(&dep_graph)?;

    if order.requires_deferred_due_to_non_nullable_cycles() {
        eprintln!("Warning: schema has non-nullable FK cycles; generation will require deferred inserts.");
    }

    let format = match args.format {
        crate::args::GraphFormat::Mermaid => VizFormat::Mermaid,
        crate::args::GraphFormat::Dot => VizFormat::Dot,
    };

    let output = visualize::visualize(&dep_graph, &order.cycle_edges, format);
    println!("{}", output);

    Ok(())
}
