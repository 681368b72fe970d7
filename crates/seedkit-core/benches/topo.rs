//! Benchmarks for FK dependency graph construction and topological sort.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use seedkit_core::schema::types::{
    Column, DataType, DatabaseSchema, DatabaseType, ForeignKey, ForeignKeyAction, PrimaryKey, Table,
};
use seedkit_core::Orchestrator;

/// A chain of `n` tables, each with a single FK to the previous one.
fn chain_schema(n: usize) -> DatabaseSchema {
    let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "bench".to_string());

    for i in 0..n {
        let name = format!("t{}", i);
        let mut table = Table::new(name.clone());
        let mut id = Column::new("id".to_string(), DataType::Integer, "integer".to_string());
        id.is_auto_increment = true;
        table.columns.insert("id".to_string(), id);
        table.primary_key = Some(PrimaryKey {
            columns: vec!["id".to_string()],
            name: None,
        });

        if i > 0 {
            let parent = format!("t{}", i - 1);
            let fk_col = format!("{}_id", parent);
            table.columns.insert(
                fk_col.clone(),
                Column::new(fk_col.clone(), DataType::Integer, "integer".to_string()),
            );
            table.foreign_keys.push(ForeignKey {
                name: None,
                source_columns: vec![fk_col],
                referenced_table: parent,
                referenced_columns: vec!["id".to_string()],
                on_delete: ForeignKeyAction::NoAction,
                on_update: ForeignKeyAction::NoAction,
                is_deferrable: false,
                unique_on_fk: false,
            });
        }

        schema.tables.insert(name, table);
    }

    schema
}

fn bench_generate_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("topo/chain");

    for table_count in [5, 20, 50] {
        let schema = chain_schema(table_count);
        let config = seedkit_core::GenerationConfig {
            default_rows: 10,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("tables", table_count),
            &schema,
            |b, schema| {
                b.iter(|| Orchestrator::generate(schema, &config).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_generate_chain);
criterion_main!(benches);
