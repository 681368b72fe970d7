use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::schema::types::DatabaseSchema;

/// Tables as nodes, foreign keys as directed edges from the dependent
/// (child) table to the table it references (parent). [`crate::graph::topo`]
/// walks this to find a generation order where parents always come before
/// the children referencing them, falling back to cycle-breaking when one
/// doesn't exist.
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
}

/// The FK metadata carried on one dependency edge.
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    pub constraint_name: Option<String>,
    pub source_columns: Vec<String>,
    pub referenced_columns: Vec<String>,
    /// True only if every source column is nullable — a cycle through this
    /// edge can be broken by nulling the FK rather than failing outright.
    pub is_nullable: bool,
    pub is_deferrable: bool,
}

impl DependencyGraph {
    /// One node per table, one edge per FK, pointing child → parent.
    pub fn from_schema(schema: &DatabaseSchema) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        // Add all tables as nodes
        for table_name in schema.tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        // Add FK edges: child table → parent table
        for (table_name, table) in &schema.tables {
            for fk in &table.foreign_keys {
                if let (Some(&from_idx), Some(&to_idx)) = (
                    node_indices.get(table_name),
                    node_indices.get(&fk.referenced_table),
                ) {
                    // Check if FK columns are all nullable
                    let is_nullable = fk.source_columns.iter().all(|col_name| {
                        table
                            .columns
                            .get(col_name)
                            .map(|c| c.nullable)
                            .unwrap_or(false)
                    });

                    graph.add_edge(
                        from_idx,
                        to_idx,
                        EdgeInfo {
                            constraint_name: fk.name.clone(),
                            source_columns: fk.source_columns.clone(),
                            referenced_columns: fk.referenced_columns.clone(),
                            is_nullable,
                            is_deferrable: fk.is_deferrable,
                        },
                    );
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    /// Get the table name for a node index.
    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Get node index for a table name.
    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    /// Get all table names in the graph.
    pub fn table_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(|s| s.as_str()).collect()
    }

    /// Get the number of tables.
    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of FK edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn make_test_schema() -> DatabaseSchema {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());

        // subscribers table (no FKs)
        let mut subscribers = Table::new("subscribers".to_string());
        subscribers.columns.insert(
            "id".to_string(),
            Column::new("id".to_string(), DataType::Serial, "serial".to_string()),
        );
        schema.tables.insert("subscribers".to_string(), subscribers);

        // invoices table (FK to subscribers, non-nullable)
        let mut invoices = Table::new("invoices".to_string());
        invoices.columns.insert(
            "id".to_string(),
            Column::new("id".to_string(), DataType::Serial, "serial".to_string()),
        );
        let mut subscriber_id_col = Column::new(
            "subscriber_id".to_string(),
            DataType::Integer,
            "integer".to_string(),
        );
        subscriber_id_col.nullable = false;
        invoices
            .columns
            .insert("subscriber_id".to_string(), subscriber_id_col);
        invoices.foreign_keys.push(ForeignKey {
            name: Some("invoices_subscriber_id_fkey".to_string()),
            source_columns: vec!["subscriber_id".to_string()],
            referenced_table: "subscribers".to_string(),
            referenced_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
            is_deferrable: false,
            unique_on_fk: false,
        });
        schema.tables.insert("invoices".to_string(), invoices);

        // line_items table (FK to invoices, nullable — e.g. a draft line item)
        let mut line_items = Table::new("line_items".to_string());
        line_items.columns.insert(
            "id".to_string(),
            Column::new("id".to_string(), DataType::Serial, "serial".to_string()),
        );
        let mut invoice_id_col = Column::new(
            "invoice_id".to_string(),
            DataType::Integer,
            "integer".to_string(),
        );
        invoice_id_col.nullable = true;
        line_items
            .columns
            .insert("invoice_id".to_string(), invoice_id_col);
        line_items.foreign_keys.push(ForeignKey {
            name: Some("line_items_invoice_id_fkey".to_string()),
            source_columns: vec!["invoice_id".to_string()],
            referenced_table: "invoices".to_string(),
            referenced_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
            is_deferrable: false,
            unique_on_fk: false,
        });
        schema.tables.insert("line_items".to_string(), line_items);

        schema
    }

    #[test]
    fn builds_one_node_per_table_and_one_edge_per_fk() {
        let schema = make_test_schema();
        let graph = DependencyGraph::from_schema(&schema);

        assert_eq!(graph.table_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn edge_nullability_reflects_the_fk_columns() {
        let schema = make_test_schema();
        let graph = DependencyGraph::from_schema(&schema);

        let invoices_idx = graph.node_index("invoices").unwrap();
        let line_items_idx = graph.node_index("line_items").unwrap();

        let invoices_to_subscribers = graph
            .graph
            .edges_connecting(invoices_idx, graph.node_index("subscribers").unwrap())
            .next()
            .unwrap();
        assert!(!invoices_to_subscribers.weight().is_nullable);

        let line_items_to_invoices = graph
            .graph
            .edges_connecting(line_items_idx, invoices_idx)
            .next()
            .unwrap();
        assert!(line_items_to_invoices.weight().is_nullable);
    }

    #[test]
    fn table_names_lists_every_node_once() {
        let schema = make_test_schema();
        let graph = DependencyGraph::from_schema(&schema);
        let mut names = graph.table_names();
        names.sort();
        assert_eq!(names, vec!["invoices", "line_items", "subscribers"]);
    }
}
