//! Tarjan strongly-connected components over the declaration graph.
//!
//! Only runs after a failed sort, to turn "there is a cycle somewhere" into a
//! precise report. Iterative form with an explicit frame stack so deep graphs
//! cannot overflow the call stack.

use crate::domain::declaration::DeclId;
use crate::domain::graph::DependencyGraph;

const UNVISITED: usize = usize::MAX;

/// All strongly-connected components, each sorted by ascending arena id,
/// components ordered by their smallest member.
pub fn strongly_connected_components(graph: &DependencyGraph) -> Vec<Vec<DeclId>> {
    let len = graph.arena_len();
    let mut index = vec![UNVISITED; len];
    let mut low_link = vec![0usize; len];
    let mut on_stack = vec![false; len];
    let mut stack: Vec<DeclId> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<DeclId>> = Vec::new();

    // One DFS frame per node being expanded: (node, next successor offset).
    let mut frames: Vec<(DeclId, usize)> = Vec::new();

    for root in graph.members() {
        if index[root.0] != UNVISITED {
            continue;
        }

        frames.push((root, 0));
        index[root.0] = next_index;
        low_link[root.0] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root.0] = true;

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            let successors = graph.successors(node);
            if frame.1 < successors.len() {
                let next = successors[frame.1];
                frame.1 += 1;

                if index[next.0] == UNVISITED {
                    frames.push((next, 0));
                    index[next.0] = next_index;
                    low_link[next.0] = next_index;
                    next_index += 1;
                    stack.push(next);
                    on_stack[next.0] = true;
                } else if on_stack[next.0] {
                    low_link[node.0] = low_link[node.0].min(index[next.0]);
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    low_link[parent.0] = low_link[parent.0].min(low_link[node.0]);
                }
                if low_link[node.0] == index[node.0] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack[member.0] = false;
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    component.sort();
                    components.push(component);
                }
            }
        }
    }

    components.sort_by_key(|c| c[0]);
    components
}

/// Components of size > 1: the actual cycles. A singleton component is not a
/// cycle; self-loops are not modeled.
pub fn cycle_components(graph: &DependencyGraph) -> Vec<Vec<DeclId>> {
    strongly_connected_components(graph)
        .into_iter()
        .filter(|c| c.len() > 1)
        .collect()
}
