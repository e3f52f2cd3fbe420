//! Arena-indexed dependency graph.
//!
//! Nodes are declaration arena indices; abstract declarations are never
//! members and never participate in ordering. Built fresh per load,
//! discarded after the sort phase.

use serde::Serialize;

use crate::domain::declaration::{DeclId, DeclarationRef};

/// Which wiring rule produced an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    /// Explicit `requires` constraint.
    Requires,
    /// Instantiable parent template before its child.
    Parent,
    /// Embedded anonymous declaration before its outer declaration.
    Embedded,
    /// Explicit property reference.
    Reference,
    /// Autowired property candidate.
    Autowire,
    /// Factory declaration before its synthesized product node.
    Product,
}

/// Predecessor-before-successor constraint between two declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: DeclId,
    pub to: DeclId,
    pub kind: EdgeKind,
}

/// Dependency graph over the declaration arena.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    member: Vec<bool>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<DeclId>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    pub fn with_capacity(arena_len: usize) -> Self {
        Self {
            member: vec![false; arena_len],
            edges: Vec::new(),
            adjacency: vec![Vec::new(); arena_len],
            in_degree: vec![0; arena_len],
        }
    }

    /// Register a declaration as a participating node.
    pub fn add_node(&mut self, id: DeclId) {
        self.grow_to(id.0 + 1);
        self.member[id.0] = true;
    }

    pub fn is_member(&self, id: DeclId) -> bool {
        self.member.get(id.0).copied().unwrap_or(false)
    }

    /// Record "`from` must be ordered before `to`". Edges between
    /// non-members are dropped; duplicate (from, to) pairs collapse.
    /// Returns whether a new edge was stored.
    pub fn add_edge(&mut self, from: DeclId, to: DeclId, kind: EdgeKind) -> bool {
        if !self.is_member(from) || !self.is_member(to) || from == to {
            return false;
        }
        if self.has_edge(from, to) {
            return false;
        }
        self.adjacency[from.0].push(to);
        self.in_degree[to.0] += 1;
        self.edges.push(Edge { from, to, kind });
        true
    }

    pub fn has_edge(&self, from: DeclId, to: DeclId) -> bool {
        self.adjacency
            .get(from.0)
            .map(|succ| succ.contains(&to))
            .unwrap_or(false)
    }

    pub fn successors(&self, id: DeclId) -> &[DeclId] {
        self.adjacency.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn members(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.member
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(i, _)| DeclId(i))
    }

    pub fn node_count(&self) -> usize {
        self.member.iter().filter(|m| **m).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Capacity of the underlying arena, including non-member slots.
    pub fn arena_len(&self) -> usize {
        self.member.len()
    }

    pub(crate) fn in_degree_snapshot(&self) -> Vec<usize> {
        self.in_degree.clone()
    }

    /// Serializable view of the graph for debugging a load.
    pub fn snapshot(&self, refs: &[DeclarationRef]) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .members()
                .map(|id| NodeSnapshot {
                    id,
                    declaration: refs.get(id.0).cloned().unwrap_or(DeclarationRef {
                        id: None,
                        class: None,
                        origin: None,
                    }),
                })
                .collect(),
            edges: self.edges.clone(),
        }
    }

    fn grow_to(&mut self, len: usize) {
        if self.member.len() < len {
            self.member.resize(len, false);
            self.adjacency.resize(len, Vec::new());
            self.in_degree.resize(len, 0);
        }
    }
}

/// Serializable view of the graph.
#[derive(Debug, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Serialize)]
pub struct NodeSnapshot {
    pub id: DeclId,
    pub declaration: DeclarationRef,
}
