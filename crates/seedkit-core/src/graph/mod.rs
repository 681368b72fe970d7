//! FK dependency graph construction and topological ordering.

pub mod dag;
pub mod topo;
pub mod visualize;
