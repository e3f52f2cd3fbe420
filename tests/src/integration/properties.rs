//! Property tests over ordering and cycle reporting.
//!
//! Random forward-edged graphs are acyclic by construction and must always
//! linearize; unconstrained random graphs must fail the sort exactly when
//! the SCC decomposition contains a component of size > 1.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use wirebox::algorithms::kahns::kahns_topological_sort;
    use wirebox::algorithms::tarjan::cycle_components;
    use wirebox::domain::declaration::DeclId;
    use wirebox::domain::graph::{DependencyGraph, EdgeKind};
    use wirebox::domain::invariants::{
        invariant_acyclic, invariant_completeness, invariant_topological_order,
    };

    fn graph_of(n: usize, edges: &[(usize, usize)]) -> DependencyGraph {
        let mut graph = DependencyGraph::with_capacity(n);
        for i in 0..n {
            graph.add_node(DeclId(i));
        }
        for &(from, to) in edges {
            graph.add_edge(DeclId(from), DeclId(to), EdgeKind::Requires);
        }
        graph
    }

    /// Every node in `component` can reach every other within the component.
    fn strongly_connected(graph: &DependencyGraph, component: &[DeclId]) -> bool {
        let members: HashSet<DeclId> = component.iter().copied().collect();
        component.iter().all(|&start| {
            let mut reached = HashSet::new();
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                for &next in graph.successors(node) {
                    if members.contains(&next) && reached.insert(next) {
                        stack.push(next);
                    }
                }
            }
            component
                .iter()
                .all(|&other| other == start || reached.contains(&other))
        })
    }

    proptest! {
        /// Forward-only random edges form a DAG; the produced order is a
        /// complete, valid linearization.
        #[test]
        fn prop_random_dag_linearizes(
            n in 1usize..40,
            raw_edges in prop::collection::vec((0usize..40, 0usize..40), 0..160),
        ) {
            let edges: Vec<(usize, usize)> = raw_edges
                .into_iter()
                .map(|(a, b)| (a % n, b % n))
                .filter(|(a, b)| a < b)
                .collect();
            let graph = graph_of(n, &edges);

            let order = kahns_topological_sort(&graph).expect("forward edges cannot cycle");
            prop_assert!(invariant_topological_order(&order, &graph));
            prop_assert!(invariant_completeness(&order, &graph));
            prop_assert!(invariant_acyclic(&graph));
            prop_assert!(cycle_components(&graph).is_empty());
        }

        /// On arbitrary random graphs the sort fails exactly when an SCC of
        /// size > 1 exists, and every reported component really is one.
        #[test]
        fn prop_cycle_detection_matches_scc_oracle(
            n in 1usize..30,
            raw_edges in prop::collection::vec((0usize..30, 0usize..30), 0..180),
        ) {
            let edges: Vec<(usize, usize)> = raw_edges
                .into_iter()
                .map(|(a, b)| (a % n, b % n))
                .filter(|(a, b)| a != b)
                .collect();
            let graph = graph_of(n, &edges);

            let sorted = kahns_topological_sort(&graph);
            let cycles = cycle_components(&graph);

            prop_assert_eq!(sorted.is_err(), !cycles.is_empty());

            match sorted {
                Ok(order) => {
                    prop_assert!(invariant_topological_order(&order, &graph));
                    prop_assert!(invariant_completeness(&order, &graph));
                }
                Err(shortfall) => {
                    let remaining: HashSet<DeclId> =
                        shortfall.remaining.into_iter().collect();
                    for component in &cycles {
                        prop_assert!(component.len() > 1);
                        prop_assert!(strongly_connected(&graph, component));
                        // Cycle members are always part of the unsortable rest.
                        for member in component {
                            prop_assert!(remaining.contains(member));
                        }
                    }
                }
            }
        }

        /// Components are pairwise disjoint: one declaration belongs to at
        /// most one reported cycle.
        #[test]
        fn prop_cycle_components_disjoint(
            n in 2usize..25,
            raw_edges in prop::collection::vec((0usize..25, 0usize..25), 0..150),
        ) {
            let edges: Vec<(usize, usize)> = raw_edges
                .into_iter()
                .map(|(a, b)| (a % n, b % n))
                .filter(|(a, b)| a != b)
                .collect();
            let graph = graph_of(n, &edges);

            let mut seen = HashSet::new();
            for component in cycle_components(&graph) {
                for member in component {
                    prop_assert!(seen.insert(member));
                }
            }
        }
    }
}
