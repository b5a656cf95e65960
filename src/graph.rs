// Copyright 2025 Cowboy AI, LLC.

//! Dependency graph over trait definitions
//!
//! Traits are nodes keyed by name. Dependency edges are directed
//! (`child -> parent`, the parent composes first); conflict edges are
//! undirected. Edges may name traits that are not registered yet; the
//! validator reports those, the graph itself accepts them.
//!
//! ```mermaid
//! graph TD
//!     Auditable --> Timestamped
//!     Timestamped --> Base
//!     Draftable -.-x Immutable
//! ```

use indexmap::{IndexMap, IndexSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::definition::TraitDefinition;
use crate::errors::{CompositionError, GraphResult};

/// In-memory graph of traits with dependency and conflict edges
///
/// Registration order is preserved and is the tie-breaker for every ordering
/// decision made over the graph. `Clone` yields a fully independent copy for
/// what-if compositions.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    traits: IndexMap<String, TraitDefinition>,
    dependencies: IndexMap<String, IndexSet<String>>,
    dependents: IndexMap<String, IndexSet<String>>,
    conflicts: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from definitions in the given order
    pub fn from_traits(definitions: impl IntoIterator<Item = TraitDefinition>) -> Self {
        let mut graph = Self::new();
        for definition in definitions {
            graph.add_trait(definition);
        }
        graph
    }

    /// Insert or replace a trait and its declared edges
    ///
    /// Re-registering a name replaces the definition and its edges but keeps
    /// the original registration position.
    pub fn add_trait(&mut self, definition: TraitDefinition) {
        let name = definition.name.clone();

        if let Some(previous) = self.traits.get(&name) {
            let old_dependencies = previous.dependencies.clone();
            let old_conflicts = previous.conflicts.clone();
            debug!(trait_name = %name, version = %definition.version, "Replacing registered trait");
            self.detach(&name, &old_dependencies, &old_conflicts);
        }

        for dependency in &definition.dependencies {
            self.dependents
                .entry(dependency.clone())
                .or_default()
                .insert(name.clone());
        }
        self.dependencies
            .insert(name.clone(), definition.dependencies.clone());
        for other in &definition.conflicts {
            self.link_conflict(&name, other);
        }

        debug!(
            trait_name = %name,
            dependencies = definition.dependencies.len(),
            conflicts = definition.conflicts.len(),
            "Registered trait"
        );
        self.traits.insert(name, definition);
    }

    fn detach(&mut self, name: &str, dependencies: &IndexSet<String>, conflicts: &IndexSet<String>) {
        for dependency in dependencies {
            if let Some(dependents) = self.dependents.get_mut(dependency) {
                dependents.shift_remove(name);
            }
        }
        for other in conflicts {
            let declared_by_other = other != name
                && self
                    .traits
                    .get(other)
                    .is_some_and(|t| t.conflicts.contains(name));
            if !declared_by_other {
                self.unlink_conflict(name, other);
            }
        }
    }

    fn link_conflict(&mut self, a: &str, b: &str) {
        self.conflicts
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.conflicts
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    fn unlink_conflict(&mut self, a: &str, b: &str) {
        if let Some(set) = self.conflicts.get_mut(a) {
            set.shift_remove(b);
        }
        if let Some(set) = self.conflicts.get_mut(b) {
            set.shift_remove(a);
        }
    }

    /// Check if a trait is registered
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains_key(name)
    }

    /// Number of registered traits
    pub fn size(&self) -> usize {
        self.traits.len()
    }

    /// True when no trait is registered
    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Registered definition by name
    pub fn get_trait(&self, name: &str) -> Option<&TraitDefinition> {
        self.traits.get(name)
    }

    /// Registered names in registration order
    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.keys().map(String::as_str)
    }

    /// Registered definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.traits.values()
    }

    /// Registration position of a trait
    pub fn insertion_index(&self, name: &str) -> Option<usize> {
        self.traits.get_index_of(name)
    }

    /// Number of declared dependency edges
    pub fn dependency_edge_count(&self) -> usize {
        self.dependencies.values().map(IndexSet::len).sum()
    }

    /// Direct dependencies of a trait, in declaration order
    pub fn get_dependencies(&self, name: &str) -> Vec<String> {
        self.dependencies
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Traits that directly depend on this one, in registration order of the edge
    pub fn get_dependents(&self, name: &str) -> Vec<String> {
        self.dependents
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every trait reachable through dependency edges, breadth first
    ///
    /// The trait itself is excluded even when a cycle leads back to it.
    /// Unregistered targets are included; they have no outgoing edges.
    pub fn get_transitive_dependencies(&self, name: &str) -> IndexSet<String> {
        let mut visited: IndexSet<String> = IndexSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        if let Some(direct) = self.dependencies.get(name) {
            queue.extend(direct.iter().map(String::as_str));
        }
        while let Some(current) = queue.pop_front() {
            if current == name || !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(next) = self.dependencies.get(current) {
                queue.extend(next.iter().map(String::as_str));
            }
        }
        visited
    }

    /// Traits this one may not be composed with, whichever side declared it
    pub fn get_conflicts(&self, name: &str) -> Vec<String> {
        self.conflicts
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if two traits share a conflict edge
    pub fn has_conflict(&self, a: &str, b: &str) -> bool {
        self.conflicts.get(a).is_some_and(|set| set.contains(b))
    }

    /// Every trait that reaches `name` through dependency edges, plus `name` itself
    pub(crate) fn ancestors_inclusive(&self, name: &str) -> IndexSet<String> {
        let mut visited: IndexSet<String> = IndexSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(next) = self.dependents.get(current) {
                queue.extend(next.iter().map(String::as_str));
            }
        }
        visited
    }

    /// Each conflict edge once, in registration order of its first endpoint
    pub(crate) fn conflict_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut seen: IndexSet<(String, String)> = IndexSet::new();
        for (a, others) in &self.conflicts {
            for b in others {
                let key = if a <= b {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                if seen.insert(key) {
                    pairs.push((a.clone(), b.clone()));
                }
            }
        }
        pairs
    }

    /// Registered-only adjacency by registration index
    pub(crate) fn index_adjacency(&self) -> Vec<Vec<usize>> {
        self.traits
            .keys()
            .map(|name| {
                self.dependencies
                    .get(name)
                    .map(|deps| {
                        deps.iter()
                            .filter_map(|dep| self.traits.get_index_of(dep))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }

    pub(crate) fn name_at(&self, index: usize) -> Option<&str> {
        self.traits.get_index(index).map(|(name, _)| name.as_str())
    }

    fn names_at(&self, indices: impl IntoIterator<Item = usize>) -> Vec<String> {
        indices
            .into_iter()
            .filter_map(|i| self.name_at(i).map(str::to_string))
            .collect()
    }

    /// Report every dependency cycle in the graph
    ///
    /// Strongly connected components come from petgraph's iterative Tarjan,
    /// so arbitrarily deep cycles are safe. Every component with more than one
    /// member, and every self-loop, is one `circular_dependency` error: `cycle`
    /// is the shortest closed walk through the earliest registered member and
    /// `members` is the whole component in registration order.
    pub fn detect_circular_dependencies(&self) -> GraphResult<()> {
        let adjacency = self.index_adjacency();
        let mut graph: DiGraph<(), ()> =
            DiGraph::with_capacity(adjacency.len(), self.dependency_edge_count());
        let nodes: Vec<NodeIndex> = (0..adjacency.len()).map(|_| graph.add_node(())).collect();
        for (from, targets) in adjacency.iter().enumerate() {
            for &to in targets {
                graph.add_edge(nodes[from], nodes[to], ());
            }
        }

        let mut cycles: Vec<(Vec<usize>, IndexSet<usize>)> = tarjan_scc(&graph)
            .into_iter()
            .map(|component| {
                let mut members: Vec<usize> = component.iter().map(|n| n.index()).collect();
                members.sort_unstable();
                members.into_iter().collect::<IndexSet<usize>>()
            })
            .filter(|members| {
                members.len() > 1 || members.iter().any(|&m| adjacency[m].contains(&m))
            })
            .map(|members| (shortest_cycle(&adjacency, &members), members))
            .collect();
        cycles.sort_by_key(|(cycle, _)| cycle.first().copied().unwrap_or_default());

        if cycles.is_empty() {
            return Ok(());
        }

        let errors: Vec<CompositionError> = cycles
            .into_iter()
            .map(|(cycle, members)| CompositionError::CircularDependency {
                cycle: self.names_at(cycle),
                members: self.names_at(members),
            })
            .collect();
        for error in &errors {
            warn!(%error, "Dependency cycle detected");
        }
        Err(errors)
    }

    /// Copy of the graph restricted to the given names
    ///
    /// Members keep their relative registration order; names that are not
    /// registered are ignored.
    pub fn subgraph<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> DependencyGraph {
        let wanted: IndexSet<&str> = names.into_iter().collect();
        let mut graph = DependencyGraph::new();
        for definition in self.traits.values() {
            if wanted.contains(definition.name.as_str()) {
                graph.add_trait(definition.clone());
            }
        }
        graph
    }

    /// Render the graph as a Mermaid diagram
    ///
    /// Dependency edges are solid arrows from dependent to dependency;
    /// conflict edges are drawn once per pair as crossed dotted links.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        let mut nodes: IndexSet<&str> = self.traits.keys().map(String::as_str).collect();
        for (name, deps) in &self.dependencies {
            nodes.insert(name.as_str());
            nodes.extend(deps.iter().map(String::as_str));
        }
        for node in &nodes {
            out.push_str(&format!("    {}[\"{}\"]\n", mermaid_id(node), node));
        }
        for (name, deps) in &self.dependencies {
            for dep in deps {
                out.push_str(&format!("    {} --> {}\n", mermaid_id(name), mermaid_id(dep)));
            }
        }
        for (a, b) in self.conflict_pairs() {
            out.push_str(&format!("    {} -.-x {}\n", mermaid_id(&a), mermaid_id(&b)));
        }
        out
    }
}

fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Shortest closed walk from the earliest member back to itself, inside the component
fn shortest_cycle(adjacency: &[Vec<usize>], members: &IndexSet<usize>) -> Vec<usize> {
    let Some(&start) = members.first() else {
        return Vec::new();
    };
    if adjacency[start].contains(&start) {
        return vec![start];
    }

    let mut parent: IndexMap<usize, usize> = IndexMap::new();
    let mut queue: VecDeque<usize> = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &next in &adjacency[node] {
            if next == start {
                let mut path = vec![node];
                let mut current = node;
                while let Some(&previous) = parent.get(&current) {
                    path.push(previous);
                    current = previous;
                }
                path.reverse();
                return path;
            }
            if members.contains(&next) && !parent.contains_key(&next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    // Unreachable for a strongly connected component.
    members.iter().copied().collect()
}
