//! Domain invariants for dependency ordering.
//!
//! Checkers shared by unit, integration and property tests. They validate an
//! order produced by the linearizer against the graph it was produced from.

use std::collections::HashSet;

use crate::domain::declaration::DeclId;
use crate::domain::graph::DependencyGraph;

/// Topological order: for every edge (from, to), `from` appears before `to`.
pub fn invariant_topological_order(order: &[DeclId], graph: &DependencyGraph) -> bool {
    let mut seen: HashSet<DeclId> = HashSet::new();

    for &node in order {
        for edge in graph.edges() {
            if edge.to != node {
                continue;
            }
            if !seen.contains(&edge.from) {
                return false;
            }
        }
        seen.insert(node);
    }

    true
}

/// Completeness: every member node is ordered exactly once.
pub fn invariant_completeness(order: &[DeclId], graph: &DependencyGraph) -> bool {
    let ordered: HashSet<DeclId> = order.iter().copied().collect();
    if ordered.len() != order.len() {
        return false;
    }
    let members: HashSet<DeclId> = graph.members().collect();
    ordered == members
}

/// The graph is a DAG (no back edges reachable from any node).
pub fn invariant_acyclic(graph: &DependencyGraph) -> bool {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();

    for node in graph.members() {
        if has_cycle_dfs(graph, node, &mut visited, &mut rec_stack) {
            return false;
        }
    }

    true
}

fn has_cycle_dfs(
    graph: &DependencyGraph,
    node: DeclId,
    visited: &mut HashSet<DeclId>,
    rec_stack: &mut HashSet<DeclId>,
) -> bool {
    if rec_stack.contains(&node) {
        return true;
    }
    if visited.contains(&node) {
        return false;
    }

    visited.insert(node);
    rec_stack.insert(node);

    for &next in graph.successors(node) {
        if has_cycle_dfs(graph, next, visited, rec_stack) {
            return true;
        }
    }

    rec_stack.remove(&node);
    false
}
