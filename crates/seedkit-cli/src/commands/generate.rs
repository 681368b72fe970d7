use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use seedkit_core::check::compute_schema_hash;
use seedkit_core::generate::orchestrator::{GenerationConfig, RepetitionRule};
use seedkit_core::generate::value_generator::DictionaryOptions;
use seedkit_core::llm;
use seedkit_core::lock;
use seedkit_core::lock::types::{ColumnOverrideLock, LockConfig, LockFile};
use seedkit_core::output;
use seedkit_core::schema::introspect::{database_type_from_url, SchemaIntrospector};
use seedkit_core::schema::types::{DatabaseSchema, DatabaseType};
use seedkit_core::{DialectWriter, Orchestrator};

use crate::args::{GenerateArgs, OutputFormat};

pub async fn run(args: &GenerateArgs) -> Result<()> {
    let config = seedkit_core::config::read_config(Path::new("."))?;

    let db_url = resolve_db_url(args.db.as_deref(), config.as_ref())?;
    let db_type = database_type_from_url(&db_url)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{prefix}] {msg}")
            .unwrap(),
    );
    pb.set_prefix("1/4");
    pb.set_message("Introspecting schema...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let schema = introspect(&db_url, db_type, args.schema.as_deref()).await?;

    pb.finish_with_message(format!(
        "Introspecting schema... done ({} tables, {} foreign keys)",
        schema.table_count(),
        schema.foreign_key_count()
    ));

    let lock_path = Path::new(lock::LOCK_FILE_NAME);
    let restored_lock = if args.from_lock {
        if !lock_path.exists() {
            bail!(
                "No {} found in current directory. Run `seedkit generate` first to create one.",
                lock::LOCK_FILE_NAME
            );
        }
        let lf = lock::read_lock_file(lock_path)?;

        let current_hash = compute_schema_hash(&schema);
        if current_hash != lf.schema_hash && !args.force {
            bail!(
                "Schema has changed since {} was created.\n\
                 Lock hash: {}\n\
                 Current:   {}\n\
                 \n\
                 Run with --force to regenerate, or delete {} and run fresh.",
                lock::LOCK_FILE_NAME,
                &lf.schema_hash[..16],
                &current_hash[..16],
                lock::LOCK_FILE_NAME,
            );
        }
        Some(lf)
    } else {
        None
    };

    let pb2 = ProgressBar::new_spinner();
    pb2.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{prefix}] {msg}")
            .unwrap(),
    );
    pb2.set_prefix("2/4");
    pb2.set_message("Building generation config...");
    pb2.enable_steady_tick(std::time::Duration::from_millis(100));

    let (seed, row_count, table_row_overrides, include, exclude, ai_enabled) =
        if let Some(ref lf) = restored_lock {
            (
                lf.seed,
                lf.config.default_row_count,
                lf.config.table_row_overrides.clone(),
                lf.config.include_tables.clone(),
                lf.config.exclude_tables.clone(),
                lf.config.ai_enabled,
            )
        } else {
            let seed = args.seed.unwrap_or_else(|| {
                if let Some(ref cfg) = config {
                    if let Some(s) = cfg.generate.seed {
                        return s;
                    }
                }
                use std::time::{SystemTime, UNIX_EPOCH};
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs()
            });

            let mut overrides = config
                .as_ref()
                .map(|c| c.table_row_overrides())
                .unwrap_or_default();
            for (k, v) in args.parse_table_rows() {
                overrides.insert(k, v);
            }

            let rows = if args.rows != 100 {
                args.rows
            } else {
                config
                    .as_ref()
                    .and_then(|c| c.generate.rows)
                    .unwrap_or(args.rows)
            };

            let include = if !args.include.is_empty() {
                args.include.clone()
            } else {
                config
                    .as_ref()
                    .and_then(|c| c.generate.include.clone())
                    .unwrap_or_default()
            };
            let exclude = if !args.exclude.is_empty() {
                args.exclude.clone()
            } else {
                config
                    .as_ref()
                    .and_then(|c| c.generate.exclude.clone())
                    .unwrap_or_default()
            };

            (seed, rows, overrides, include, exclude, args.ai)
        };

    let rows_per_table: HashMap<String, usize> = table_row_overrides
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();

    let deferred = config
        .as_ref()
        .and_then(|c| c.generate.deferred)
        .unwrap_or(false);
    let numeric_scale = config
        .as_ref()
        .and_then(|c| c.generate.numeric_scale)
        .unwrap_or(2);
    let pk_uuid_overrides = config
        .as_ref()
        .and_then(|c| c.generate.pk_uuid_overrides.clone())
        .unwrap_or_default();
    let dictionaries = DictionaryOptions {
        use_latin_dictionary: config
            .as_ref()
            .and_then(|c| c.generate.use_latin_dictionary)
            .unwrap_or(true),
        use_english_dictionary: config
            .as_ref()
            .and_then(|c| c.generate.use_english_dictionary)
            .unwrap_or(true),
        use_spanish_dictionary: config
            .as_ref()
            .and_then(|c| c.generate.use_spanish_dictionary)
            .unwrap_or(true),
    };

    let column_overrides = config
        .as_ref()
        .map(|c| c.columns.clone())
        .unwrap_or_default();
    let ai_columns = config
        .as_ref()
        .map(|c| c.ai_columns())
        .unwrap_or_default();

    let filtered_schema = filter_tables(&schema, &include, &exclude);

    let generation_config = GenerationConfig {
        rows_per_table,
        default_rows: row_count,
        deferred,
        pk_uuid_overrides,
        excluded_columns: HashMap::new(),
        repetition_rules: HashMap::<String, Vec<RepetitionRule>>::new(),
        soft_delete_columns: HashMap::new(),
        soft_delete_use_schema_default: false,
        soft_delete_value: None,
        numeric_scale,
        dictionaries,
        seed: Some(seed),
    };

    pb2.finish_with_message("Building generation config... done");

    let pb3 = ProgressBar::new_spinner();
    pb3.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [3/4] {msg}")
            .unwrap(),
    );
    pb3.set_message("Generating rows...");
    pb3.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut result = Orchestrator::generate(&filtered_schema, &generation_config)?;
    let total_rows: usize = result.rows.values().map(|r| r.len()).sum();

    pb3.finish_with_message(format!("Generating rows... done ({} rows)", total_rows));

    let ai_filled_values = if ai_enabled {
        pb3.set_message("Filling AI-marked columns...");
        let provider = llm::LlmProvider::from_env(args.model.as_deref())
            .context("--ai flag requires an LLM API key (ANTHROPIC_API_KEY or OPENAI_API_KEY)")?;
        let value_provider = llm::LlmValueProvider::new(provider);
        let filled =
            llm::fill_ai_columns(&mut result, &filtered_schema, &value_provider, &ai_columns).await;
        eprintln!("Filled {} AI-marked column(s)", filled.len());
        if filled.is_empty() {
            None
        } else {
            Some(filled)
        }
    } else if let Some(ref lf) = restored_lock {
        if let Some(ref cached) = lf.config.ai_filled_values {
            replay_cached_ai_values(&mut result, cached);
        }
        lf.config.ai_filled_values.clone()
    } else {
        None
    };

    let pb4 = ProgressBar::new_spinner();
    pb4.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [4/4] {msg}")
            .unwrap(),
    );
    pb4.set_prefix("4/4");

    match &args.output {
        Some(path) => {
            pb4.set_message(format!("Writing to {}...", path));
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            let mut writer = BufWriter::new(file);
            write_output(&mut writer, &filtered_schema, &result, args, deferred)?;
            pb4.finish_with_message(format!("Writing to {}... done", path));
            eprintln!(
                "\nGenerated {} rows across {} tables -> {}",
                total_rows,
                result.rows.len(),
                path
            );
        }
        None => {
            pb4.set_message("Writing to stdout...");
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_output(&mut writer, &filtered_schema, &result, args, deferred)?;
            pb4.finish_with_message("Writing to stdout... done");
        }
    }

    let lock_file = LockFile::new(
        compute_schema_hash(&schema),
        seed,
        chrono::Utc::now().naive_utc(),
        LockConfig {
            default_row_count: row_count,
            table_row_overrides,
            ai_enabled,
            include_tables: include,
            exclude_tables: exclude,
            ai_filled_values,
            column_overrides: if column_overrides.is_empty() {
                None
            } else {
                Some(
                    column_overrides
                        .iter()
                        .filter(|(_, cfg)| cfg.values.is_some())
                        .map(|(k, cfg)| {
                            (
                                k.clone(),
                                ColumnOverrideLock {
                                    values: cfg.values.clone(),
                                    weights: cfg.weights.clone(),
                                },
                            )
                        })
                        .collect(),
                )
            },
        },
        schema,
    );
    lock::write_lock_file(&lock_file, lock_path)?;
    eprintln!("Lock file written to {}", lock::LOCK_FILE_NAME);

    Ok(())
}

async fn introspect(
    db_url: &str,
    db_type: DatabaseType,
    schema_name: Option<&str>,
) -> Result<DatabaseSchema> {
    Ok(match db_type {
        DatabaseType::PostgreSQL => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let introspector = match schema_name {
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
            let db_name = schema_name
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
    })
}

fn write_output<W: std::io::Write>(
    writer: &mut W,
    schema: &DatabaseSchema,
    result: &seedkit_core::GenerationResult,
    args: &GenerateArgs,
    deferred: bool,
) -> Result<()> {
    match args.output_format() {
        OutputFormat::Sql => {
            let dialect_writer = DialectWriter::new(schema);
            dialect_writer.write_script(writer, result, deferred)?;
        }
        OutputFormat::Json => {
            output::json::write_json(writer, result)?;
        }
        OutputFormat::Csv => {
            output::csv::write_csv(writer, result)?;
        }
    }
    Ok(())
}

/// Drop tables outside the include/exclude filter before generation, so
/// filtered-out tables never occupy rows in the FK dependency graph.
fn filter_tables(schema: &DatabaseSchema, include: &[String], exclude: &[String]) -> DatabaseSchema {
    if include.is_empty() && exclude.is_empty() {
        return schema.clone();
    }

    let mut filtered = schema.clone();
    filtered.tables.retain(|name, _| {
        let included = include.is_empty() || include.iter().any(|t| t == name);
        let excluded = exclude.iter().any(|t| t == name);
        included && !excluded
    });

    let kept: std::collections::HashSet<String> = filtered.tables.keys().cloned().collect();
    for table in filtered.tables.values_mut() {
        table
            .foreign_keys
            .retain(|fk| kept.contains(&fk.referenced_table));
    }

    filtered
}

/// Repopulate a restored generation's AI-filled columns from the lock file
/// instead of re-querying the provider, so `--from-lock` stays fully offline.
fn replay_cached_ai_values(
    result: &mut seedkit_core::GenerationResult,
    cached: &std::collections::BTreeMap<String, Vec<String>>,
) {
    for (key, values) in cached {
        let Some((table, column)) = key.split_once('.') else {
            continue;
        };
        if values.is_empty() {
            continue;
        }
        if let Some(rows) = result.rows.get_mut(table) {
            for (i, row) in rows.iter_mut().enumerate() {
                let value = &values[i % values.len()];
                row.insert(
                    column.to_string(),
                    seedkit_core::Value::String(value.clone().into()),
                );
            }
        }
    }
}

/// Resolve database URL from args, env, .env file, or seedkit.toml.
fn resolve_db_url(
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

fn extract_mysql_db_name(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .map(|s| s.split('?').next().unwrap_or(s).to_string())
}
