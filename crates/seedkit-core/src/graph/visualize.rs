use crate::graph::dag::DependencyGraph;
use crate::graph::topo::CycleEdge;
use petgraph::visit::EdgeRef;

/// Output format for graph visualization.
pub enum GraphFormat {
    Mermaid,
    Dot,
}

/// Generate a visualization of the dependency graph, highlighting FK edges
/// that close a cycle.
pub fn visualize(graph: &DependencyGraph, cycle_edges: &[CycleEdge], format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph, cycle_edges),
        GraphFormat::Dot => generate_dot(graph, cycle_edges),
    }
}

fn generate_mermaid(graph: &DependencyGraph, cycle_edges: &[CycleEdge]) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.table_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = edge.weight().source_columns.join(", ");
        output.push_str(&format!("    {} -->|{}| {}\n", from, label, to));
    }

    for cycle in cycle_edges {
        let label = cycle.source_columns.join(", ");
        output.push_str(&format!(
            "    {} -.->|{} (cycle)| {}\n",
            cycle.source_table, label, cycle.target_table
        ));
    }

    if !cycle_edges.is_empty() {
        output.push_str("\n    %% Edges that close a dependency cycle are dashed\n");
    }

    output
}

fn generate_dot(graph: &DependencyGraph, cycle_edges: &[CycleEdge]) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = edge.weight().source_columns.join(", ");
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from, to, label
        ));
    }

    for cycle in cycle_edges {
        let label = cycle.source_columns.join(", ");
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{} (cycle)\", style=dashed, color=red];\n",
            cycle.source_table, cycle.target_table, label
        ));
    }

    output.push_str("}\n");
    output
}
