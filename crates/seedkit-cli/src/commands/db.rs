//! Shared connection plumbing for commands that talk to a live database.

use anyhow::{Context, Result};

use seedkit_core::schema::introspect::{database_type_from_url, SchemaIntrospector};
use seedkit_core::schema::types::{DatabaseSchema, DatabaseType};

/// Resolve a database URL from (in order) an explicit `--db` flag, the
/// `DATABASE_URL` env var, a `.env` file, or `seedkit.toml`.
pub fn resolve_db_url(
    explicit: Option<&str>,
    config: Option<&seedkit_core::config::SeedKitConfig>,
) -> Result<String> {
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }
    if dotenvy::dotenv().is_ok() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return Ok(url);
        }
    }
    if let Some(cfg) = config {
        if let Some(ref url) = cfg.database.url {
            return Ok(url.clone());
        }
    }
    Err(seedkit_core::error::SeedKitError::NoDatabaseUrl.into())
}

/// For a MySQL URL, pull the trailing `/database_name` path segment off
/// (ignoring any `?option=...` query string), falling back to `"mysql"`.
pub fn extract_mysql_db_name(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .map(|s| s.split('?').next().unwrap_or(s).to_string())
}

/// Connect to `db_url` and introspect its schema, honoring an optional
/// schema/database name override (Postgres schema, or MySQL database name).
pub async fn connect_and_introspect(
    db_url: &str,
    db_type: DatabaseType,
    schema_override: Option<&str>,
) -> Result<DatabaseSchema> {
    let schema = match db_type {
        DatabaseType::PostgreSQL => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let introspector = match schema_override {
                Some(name) => {
                    seedkit_core::schema::postgres::PostgresIntrospector::with_schema(pool, name.to_string())
                }
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
            let db_name = schema_override
                .map(|s| s.to_string())
                .or_else(|| extract_mysql_db_name(db_url))
                .unwrap_or_else(|| "mysql".to_string());
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
    Ok(schema)
}

/// Resolve the database URL and type together, the common first step of
/// every command that talks to a live database.
pub async fn resolve_db(
    explicit: Option<&str>,
    config: Option<&seedkit_core::config::SeedKitConfig>,
) -> Result<(String, DatabaseType)> {
    let db_url = resolve_db_url(explicit, config)?;
    let db_type = database_type_from_url(&db_url)?;
    Ok((db_url, db_type))
}
