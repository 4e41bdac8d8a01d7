//! Core graph types
//!
//! This module contains the dependency graph structure shared by all edge
//! collectors and consumed by cycle marking and serialization.

use std::collections::{BTreeMap, BTreeSet};

use crate::manifest::SourceKind;

/// Attributes of a single dependency edge: the sources that produced it
/// (manifest lists and/or dynamic analysis), and whether it lies on a
/// dependency cycle.
///
/// An edge is never stored with an empty source set — every insertion goes
/// through [`DependencyGraph::add_edge`], which requires a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeInfo {
    pub sources: BTreeSet<SourceKind>,
    pub cycle: bool,
}

impl EdgeInfo {
    /// True when the edge was discovered purely through source analysis,
    /// without a runtime manifest declaration backing it.
    pub fn is_non_production(&self) -> bool {
        !self.sources.contains(&SourceKind::Runtime)
    }
}

/// Directed dependency graph between workspace packages.
///
/// Nodes are package names; each node owns its outgoing edge map. Both maps
/// are ordered by name, which fixes the iteration order used by cycle
/// discovery and serialization. Every name that appears as a dependency also
/// exists as a top-level node, and a package never has an edge to itself.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, BTreeMap<String, EdgeInfo>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `name` exists as a graph node, with no outgoing edges if newly
    /// seen.
    pub fn ensure_node(&mut self, name: &str) {
        if !self.nodes.contains_key(name) {
            self.nodes.insert(name.to_string(), BTreeMap::new());
        }
    }

    /// Insert an edge `dependent -> dependency` tagged with `kind`.
    ///
    /// Self-edges are suppressed. Re-inserting an existing edge merges `kind`
    /// into its source set instead of duplicating it, so insertion is
    /// commutative and idempotent.
    pub fn add_edge(&mut self, dependent: &str, dependency: &str, kind: SourceKind) {
        if dependent == dependency {
            return;
        }

        self.ensure_node(dependency);

        self.nodes
            .entry(dependent.to_string())
            .or_default()
            .entry(dependency.to_string())
            .or_default()
            .sources
            .insert(kind);
    }

    /// Flag an existing edge as lying on a cycle. Returns false if the edge
    /// does not exist.
    pub fn mark_cycle_edge(&mut self, dependent: &str, dependency: &str) -> bool {
        match self
            .nodes
            .get_mut(dependent)
            .and_then(|edges| edges.get_mut(dependency))
        {
            Some(edge) => {
                edge.cycle = true;
                true
            }
            None => false,
        }
    }

    pub fn edge(&self, dependent: &str, dependency: &str) -> Option<&EdgeInfo> {
        self.nodes.get(dependent)?.get(dependency)
    }

    /// Node names in iteration order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Outgoing edges of `name` in iteration order.
    pub fn edges_from(&self, name: &str) -> impl Iterator<Item = (&str, &EdgeInfo)> {
        self.nodes
            .get(name)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(dep, info)| (dep.as_str(), info)))
    }

    /// All edges as `(dependent, dependency, info)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeInfo)> {
        self.nodes.iter().flat_map(|(dependent, edges)| {
            edges
                .iter()
                .map(move |(dep, info)| (dependent.as_str(), dep.as_str(), info))
        })
    }

    /// Whether any outgoing edge of `name` lies on a cycle.
    pub fn node_in_cycle(&self, name: &str) -> bool {
        self.edges_from(name).any(|(_, info)| info.cycle)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
