//! Topological ordering of the table dependency graph.
//!
//! Unlike a plain `toposort`, this never fails on a cycle: self-referencing
//! tables and multi-table cycles are detected via Tarjan's SCC algorithm,
//! condensed into a DAG, and ordered with Kahn's algorithm. Tables inside a
//! cycle still get a total order (good enough to INSERT them in); it is up
//! to [`crate::generate::foreign_key::ForeignKeyResolver`] to null out or
//! defer the specific FK columns that close the loop.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::error::Result;
use crate::graph::dag::DependencyGraph;

/// Result of topological sorting — an ordered list of table names
/// for safe insertion (parents before children).
#[derive(Debug, Clone)]
pub struct InsertionOrder {
    /// Tables in the order they should be inserted (parents first).
    pub tables: Vec<String>,
    /// FK edges that close a cycle. These are not removed from the
    /// dependency graph; they're surfaced so the caller knows which
    /// FK columns may need per-row deferred resolution.
    pub cycle_edges: Vec<CycleEdge>,
}

/// An FK edge that participates in a strongly connected component (a
/// multi-table cycle, or a table referencing itself).
#[derive(Debug, Clone)]
pub struct CycleEdge {
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    /// Whether every FK column in this edge is nullable. A non-nullable
    /// cycle edge cannot be satisfied by nulling out the FK and must go
    /// through deferred (insert-then-UPDATE) resolution instead.
    pub is_nullable: bool,
}

impl InsertionOrder {
    /// True if any cycle edge has a non-nullable FK column, meaning deferred
    /// mode is required to insert the tables in that cycle at all.
    pub fn requires_deferred_due_to_non_nullable_cycles(&self) -> bool {
        self.cycle_edges.iter().any(|edge| !edge.is_nullable)
    }
}

/// Compute a topological order of the dependency graph that tolerates
/// cycles: parents (in the condensation DAG sense) come before children,
/// and any table inside a cycle still receives a single deterministic slot.
pub fn topological_sort(graph: &DependencyGraph) -> Result<InsertionOrder> {
    let sccs = tarjan_scc(&graph.graph);

    // Map each node to the index of the SCC that owns it. petgraph's
    // `tarjan_scc` output order is not something we want to depend on for
    // determinism, so SCC ids are reassigned below by ascending minimum
    // node index (i.e. roughly table insertion order).
    let mut raw_scc_of: HashMap<NodeIndex, usize> = HashMap::new();
    for (raw_id, members) in sccs.iter().enumerate() {
        for &node in members {
            raw_scc_of.insert(node, raw_id);
        }
    }

    let mut order_of_raw: Vec<usize> = (0..sccs.len()).collect();
    order_of_raw.sort_by_key(|&raw_id| sccs[raw_id].iter().map(|n| n.index()).min().unwrap());
    let mut scc_id_of_raw = vec![0usize; sccs.len()];
    for (new_id, &raw_id) in order_of_raw.iter().enumerate() {
        scc_id_of_raw[raw_id] = new_id;
    }

    let scc_of = |node: NodeIndex| -> usize { scc_id_of_raw[raw_scc_of[&node]] };

    let mut members: Vec<Vec<NodeIndex>> = vec![Vec::new(); sccs.len()];
    for (raw_id, nodes) in sccs.iter().enumerate() {
        members[scc_id_of_raw[raw_id]] = nodes.clone();
    }
    for group in members.iter_mut() {
        group.sort_by_key(|&n| graph.table_name(n).to_string());
    }

    // Condensation: edge parent-SCC -> child-SCC (reverse of the original
    // child -> parent edges), so Kahn's algorithm naturally yields parents
    // before children without a final reversal.
    let mut condensation_adj: Vec<HashSet<usize>> = vec![HashSet::new(); members.len()];
    let mut indegree = vec![0usize; members.len()];
    let mut cycle_edges = Vec::new();

    for edge in graph.graph.edge_references() {
        let child_scc = scc_of(edge.source());
        let parent_scc = scc_of(edge.target());
        if child_scc == parent_scc {
            cycle_edges.push(CycleEdge {
                source_table: graph.table_name(edge.source()).to_string(),
                source_columns: edge.weight().source_columns.clone(),
                target_table: graph.table_name(edge.target()).to_string(),
                target_columns: edge.weight().referenced_columns.clone(),
                is_nullable: edge.weight().is_nullable,
            });
            continue;
        }
        if condensation_adj[parent_scc].insert(child_scc) {
            indegree[child_scc] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..members.len())
        .filter(|&id| indegree[id] == 0)
        .collect();
    let mut queue_vec: Vec<usize> = queue.drain(..).collect();
    queue_vec.sort_unstable();
    let mut queue: VecDeque<usize> = queue_vec.into();

    let mut scc_order = Vec::with_capacity(members.len());
    while let Some(scc_id) = queue.pop_front() {
        scc_order.push(scc_id);
        let mut newly_ready: Vec<usize> = Vec::new();
        for &next in &condensation_adj[scc_id] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                newly_ready.push(next);
            }
        }
        newly_ready.sort_unstable();
        queue.extend(newly_ready);
    }

    let mut tables = Vec::new();
    for scc_id in scc_order {
        for &node in &members[scc_id] {
            tables.push(graph.table_name(node).to_string());
        }
    }

    Ok(InsertionOrder {
        tables,
        cycle_edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn fk(source: &str, target: &str, nullable: bool) -> (Column, ForeignKey) {
        let mut col = Column::new(source.to_string(), DataType::Integer, "integer".to_string());
        col.nullable = nullable;
        let fk = ForeignKey {
            name: None,
            source_columns: vec![source.to_string()],
            referenced_table: target.to_string(),
            referenced_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
            is_deferrable: false,
            unique_on_fk: false,
        };
        (col, fk)
    }

    #[test]
    fn test_topological_sort_simple() {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());

        let users = Table::new("users".to_string());
        schema.tables.insert("users".to_string(), users);

        let mut orders = Table::new("orders".to_string());
        let (col, fk) = fk("user_id", "users", false);
        orders.columns.insert("user_id".to_string(), col);
        orders.foreign_keys.push(fk);
        schema.tables.insert("orders".to_string(), orders);

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph).unwrap();

        let users_pos = order.tables.iter().position(|t| t == "users").unwrap();
        let orders_pos = order.tables.iter().position(|t| t == "orders").unwrap();

        assert!(users_pos < orders_pos, "users must come before orders");
        assert!(order.cycle_edges.is_empty());
    }

    #[test]
    fn test_self_referencing_table_does_not_fail() {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());
        let mut employees = Table::new("employees".to_string());
        let (col, fk) = fk("manager_id", "employees", true);
        employees.columns.insert("manager_id".to_string(), col);
        employees.foreign_keys.push(fk);
        schema.tables.insert("employees".to_string(), employees);

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph).unwrap();

        assert_eq!(order.tables, vec!["employees".to_string()]);
        assert_eq!(order.cycle_edges.len(), 1);
    }

    #[test]
    fn test_two_table_cycle_gets_deterministic_order() {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());

        let mut a = Table::new("a".to_string());
        let (col_a, fk_a) = fk("b_id", "b", true);
        a.columns.insert("b_id".to_string(), col_a);
        a.foreign_keys.push(fk_a);
        schema.tables.insert("a".to_string(), a);

        let mut b = Table::new("b".to_string());
        let (col_b, fk_b) = fk("a_id", "a", true);
        b.columns.insert("a_id".to_string(), col_b);
        b.foreign_keys.push(fk_b);
        schema.tables.insert("b".to_string(), b);

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph).unwrap();

        assert_eq!(order.tables.len(), 2);
        assert_eq!(order.cycle_edges.len(), 2);
        // members of a single SCC are sorted by ascending table name
        assert_eq!(order.tables, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unrelated_tables_come_before_their_dependents() {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test".to_string());
        schema
            .tables
            .insert("z_table".to_string(), Table::new("z_table".to_string()));

        let mut child = Table::new("child".to_string());
        let (col, fk) = fk("z_id", "z_table", false);
        child.columns.insert("z_id".to_string(), col);
        child.foreign_keys.push(fk);
        schema.tables.insert("child".to_string(), child);

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph).unwrap();
        let z_pos = order.tables.iter().position(|t| t == "z_table").unwrap();
        let child_pos = order.tables.iter().position(|t| t == "child").unwrap();
        assert!(z_pos < child_pos);
    }
}
