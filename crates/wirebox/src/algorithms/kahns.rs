//! Kahn's topological sort over the declaration graph.
//!
//! O(V + E) in-degree elimination; the expected path for every load. A
//! shortfall (fewer ordered nodes than members) means at least one cycle and
//! hands over to the SCC reporter.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::domain::declaration::DeclId;
use crate::domain::graph::DependencyGraph;

/// Nodes left with positive in-degree after the queue drained.
#[derive(Debug)]
pub struct SortShortfall {
    pub remaining: Vec<DeclId>,
}

/// Produce a topological order of the graph's member nodes, ties broken by
/// ascending arena id so the same declaration set always orders the same way.
pub fn kahns_topological_sort(graph: &DependencyGraph) -> Result<Vec<DeclId>, SortShortfall> {
    let mut in_degree = graph.in_degree_snapshot();

    let mut queue: BinaryHeap<Reverse<DeclId>> = graph
        .members()
        .filter(|id| in_degree[id.0] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(Reverse(node)) = queue.pop() {
        order.push(node);

        for &next in graph.successors(node) {
            let degree = &mut in_degree[next.0];
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                queue.push(Reverse(next));
            }
        }
    }

    if order.len() < graph.node_count() {
        let remaining = graph
            .members()
            .filter(|id| in_degree[id.0] > 0)
            .collect();
        return Err(SortShortfall { remaining });
    }

    Ok(order)
}
