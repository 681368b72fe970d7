use indexmap::IndexMap;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::{Result, SeedKitError};
use crate::schema::introspect::SchemaIntrospector;
use crate::schema::types::*;

pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn introspect_tables(&self) -> Result<IndexMap<String, Table>> {
        let query = "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SeedKitError::Introspection {
                query: "fetch tables".to_string(),
                source: e,
            })?;

        let mut tables = IndexMap::new();
        for row in rows {
            let name: String = row.get("name");
            tables.insert(name.clone(), Table::new(name));
        }
        Ok(tables)
    }

    async fn introspect_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA table_info(\"{}\")", table_name);
            let rows = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SeedKitError::Introspection {
                    query: format!("PRAGMA table_info({})", table_name),
                    source: e,
                })?;

            for row in rows {
                let cid: i32 = row.get("cid");
                let name: String = row.get("name");
                let type_str: String = row.get("type");
                let notnull: i32 = row.get("notnull");
                let dflt_value: Option<String> = row.get("dflt_value");
                let pk: i32 = row.get("pk");

                let data_type = DataType::from_raw(&type_str);
                let is_auto = pk > 0 && type_str.to_uppercase().contains("INTEGER");

                let mut column = Column::new(name.clone(), data_type, type_str);
                column.nullable = notnull == 0;
                column.has_default = dflt_value.is_some();
                column.is_auto_increment = is_auto;
                column.ordinal_position = cid as u32;
                column.is_uuid = column.is_uuid || super::postgres::uuid_name_heuristic(&name);

                if let Some(table) = tables.get_mut(&table_name) {
                    // Set primary key if pk > 0
                    if pk > 0 {
                        let primary_key = table.primary_key.get_or_insert_with(|| PrimaryKey {
                            columns: Vec::new(),
                            name: None,
                        });
                        primary_key.columns.push(name.clone());
                    }
                    table.columns.insert(name, column);
                }
            }
        }

        Ok(())
    }

    async fn introspect_foreign_keys(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA foreign_key_list(\"{}\")", table_name);
            let rows = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SeedKitError::Introspection {
                    query: format!("PRAGMA foreign_key_list({})", table_name),
                    source: e,
                })?;

            // Group by id (FK id)
            let mut fk_map: IndexMap<i32, ForeignKey> = IndexMap::new();
            for row in &rows {
                let id: i32 = row.get("id");
                let table: String = row.get("table");
                let from: String = row.get("from");
                let to: String = row.get("to");
                let on_delete: String = row.get("on_delete");
                let on_update: String = row.get("on_update");

                let entry = fk_map.entry(id).or_insert_with(|| ForeignKey {
                    name: None,
                    source_columns: Vec::new(),
                    referenced_table: table,
                    referenced_columns: Vec::new(),
                    on_delete: ForeignKeyAction::parse_action(&on_delete),
                    on_update: ForeignKeyAction::parse_action(&on_update),
                    is_deferrable: false,
                    unique_on_fk: false,
                });
                entry.source_columns.push(from);
                entry.referenced_columns.push(to);
            }

            if let Some(table) = tables.get_mut(&table_name) {
                for (_, fk) in fk_map {
                    table.foreign_keys.push(fk);
                }
            }
        }

        Ok(())
    }

    async fn introspect_unique_constraints(
        &self,
        tables: &mut IndexMap<String, Table>,
    ) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA index_list(\"{}\")", table_name);
            let indexes = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SeedKitError::Introspection {
                    query: format!("PRAGMA index_list({})", table_name),
                    source: e,
                })?;

            for idx_row in &indexes {
                let unique: i32 = idx_row.get("unique");
                let idx_name: String = idx_row.get("name");

                if unique == 1 {
                    let info_query = format!("PRAGMA index_info(\"{}\")", idx_name);
                    let cols = sqlx::query(&info_query)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(|e| SeedKitError::Introspection {
                            query: format!("PRAGMA index_info({})", idx_name),
                            source: e,
                        })?;

                    let columns: Vec<String> = cols.iter().map(|r| r.get("name")).collect();

                    if let Some(table) = tables.get_mut(&table_name) {
                        table.unique_constraints.push(UniqueConstraint {
                            name: Some(idx_name),
                            columns,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// SQLite has no `information_schema.check_constraints` equivalent;
    /// CHECK clauses are extracted from the table's own `CREATE TABLE` SQL
    /// text by scanning for balanced parens following a `CHECK` keyword.
    async fn introspect_check_constraints(
        &self,
        tables: &mut IndexMap<String, Table>,
    ) -> Result<()> {
        let query =
            "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";
        let rows = sqlx::query(query).fetch_all(&self.pool).await.map_err(|e| {
            SeedKitError::Introspection {
                query: "fetch table definitions".to_string(),
                source: e,
            }
        })?;

        for row in rows {
            let table_name: String = row.get("name");
            let sql: Option<String> = row.get("sql");
            let Some(sql) = sql else { continue };

            for expr in extract_check_clauses(&sql) {
                if let Some(table) = tables.get_mut(&table_name) {
                    table.check_constraints.push(CheckConstraint {
                        name: None,
                        expression: expr,
                    });
                }
            }
        }

        Ok(())
    }

    fn mark_unique_foreign_keys(&self, tables: &mut IndexMap<String, Table>) {
        for table in tables.values_mut() {
            let unique_sets: Vec<std::collections::BTreeSet<&str>> = table
                .unique_constraints
                .iter()
                .map(|uc| uc.columns.iter().map(String::as_str).collect())
                .chain(
                    table
                        .primary_key
                        .iter()
                        .map(|pk| pk.columns.iter().map(String::as_str).collect()),
                )
                .collect();

            for fk in table.foreign_keys.iter_mut() {
                let fk_set: std::collections::BTreeSet<&str> =
                    fk.source_columns.iter().map(String::as_str).collect();
                fk.unique_on_fk = unique_sets.iter().any(|set| *set == fk_set);
            }
        }
    }
}

/// Scan `sql` for each `CHECK (...)` clause, respecting nested parens, and
/// return the contents of the outermost parens (without them).
fn extract_check_clauses(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let lower = sql.to_lowercase();
    let mut clauses = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find("check") {
        let kw_start = search_from + rel;
        let after_kw = kw_start + "check".len();
        let open = match sql[after_kw..].find('(') {
            Some(offset) if sql[after_kw..after_kw + offset].trim().is_empty() => {
                after_kw + offset
            }
            _ => {
                search_from = after_kw;
                continue;
            }
        };

        let mut depth = 0i32;
        let mut end = None;
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        if let Some(end) = end {
            clauses.push(sql[open + 1..end].trim().to_string());
            search_from = end + 1;
        } else {
            break;
        }
    }

    clauses
}

impl SchemaIntrospector for SqliteIntrospector {
    async fn introspect(&self) -> Result<DatabaseSchema> {
        let mut schema = DatabaseSchema::new(DatabaseType::SQLite, "sqlite".to_string());

        schema.tables = self.introspect_tables().await?;
        self.introspect_columns(&mut schema.tables).await?;
        self.introspect_foreign_keys(&mut schema.tables).await?;
        self.introspect_unique_constraints(&mut schema.tables)
            .await?;
        self.introspect_check_constraints(&mut schema.tables)
            .await?;
        self.mark_unique_foreign_keys(&mut schema.tables);

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_check_clauses_simple() {
        let sql = "CREATE TABLE t (val INT, CHECK (val BETWEEN 10 AND 20))";
        let clauses = extract_check_clauses(sql);
        assert_eq!(clauses, vec!["val BETWEEN 10 AND 20"]);
    }

    #[test]
    fn test_extract_check_clauses_nested_parens() {
        let sql = "CREATE TABLE t (status TEXT, CHECK (status IN ('a', 'b', 'c')))";
        let clauses = extract_check_clauses(sql);
        assert_eq!(clauses, vec!["status IN ('a', 'b', 'c')"]);
    }

    #[test]
    fn test_extract_check_clauses_none() {
        let sql = "CREATE TABLE t (id INTEGER PRIMARY KEY)";
        assert!(extract_check_clauses(sql).is_empty());
    }
}
