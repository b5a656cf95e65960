// Copyright 2025 Cowboy AI, LLC.

//! Deterministic composition order
//!
//! Kahn's algorithm over dependency edges. Whenever several traits are ready
//! at once, the one registered first goes first, so sorting the same graph
//! twice yields the same order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info};

use crate::errors::{CompositionError, GraphResult};
use crate::graph::DependencyGraph;
use crate::validator::DependencyValidator;

/// Order every registered trait so dependencies come before their dependents
///
/// Conflict edges do not influence ordering and edges to unregistered traits
/// are skipped. When a cycle blocks completion, every cycle is reported as
/// in [`DependencyGraph::detect_circular_dependencies`].
pub fn topological_sort(graph: &DependencyGraph) -> GraphResult<Vec<String>> {
    let parents = graph.index_adjacency();
    let count = parents.len();

    let mut in_degree = vec![0usize; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (child, deps) in parents.iter().enumerate() {
        in_degree[child] = deps.len();
        for &parent in deps {
            children[parent].push(child);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    let mut order: Vec<usize> = Vec::with_capacity(count);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &child in &children[node] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if order.len() < count {
        debug!(
            sorted = order.len(),
            total = count,
            "Topological sort stalled on remaining traits"
        );
        graph.detect_circular_dependencies()?;
        // Stalled without a detected cycle: report the unsorted remainder.
        let remaining: Vec<String> = (0..count)
            .filter(|node| in_degree[*node] > 0)
            .filter_map(|node| graph.name_at(node).map(str::to_string))
            .collect();
        return Err(vec![CompositionError::CircularDependency {
            cycle: remaining.clone(),
            members: remaining,
        }]);
    }

    let names: Vec<String> = order
        .into_iter()
        .filter_map(|node| graph.name_at(node).map(str::to_string))
        .collect();
    debug!(traits = names.len(), "Topological sort complete");
    Ok(names)
}

/// Validate existence and conflicts, then sort
///
/// All problems are gathered before returning: missing dependencies,
/// conflicts and cycles are reported together.
pub fn validate_and_sort(graph: &DependencyGraph) -> GraphResult<Vec<String>> {
    let validator = DependencyValidator::new(graph);
    let mut errors = Vec::new();

    if let Err(mut missing) = validator.validate_dependencies_exist() {
        errors.append(&mut missing);
    }
    if let Err(mut conflicts) = validator.validate() {
        errors.append(&mut conflicts);
    }

    match topological_sort(graph) {
        Ok(order) if errors.is_empty() => {
            info!(
                traits = order.len(),
                edges = graph.dependency_edge_count(),
                "Validated and sorted trait graph"
            );
            Ok(order)
        }
        Ok(_) => Err(errors),
        Err(mut cycles) => {
            errors.append(&mut cycles);
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TraitDefinition;
    use crate::errors::ErrorKind;

    fn node(name: &str, deps: &[&str]) -> TraitDefinition {
        deps.iter()
            .fold(TraitDefinition::new(name, "1.0.0"), |t, d| t.depends_on(*d))
    }

    /// Test that dependencies precede dependents
    ///
    /// ```mermaid
    /// graph TD
    ///     Auditable --> Timestamped
    ///     Timestamped --> Base
    /// ```
    #[test]
    fn test_chain_is_ordered_parent_first() {
        let graph = DependencyGraph::from_traits([
            node("Auditable", &["Timestamped"]),
            node("Timestamped", &["Base"]),
            node("Base", &[]),
        ]);
        let order = topological_sort(&graph).unwrap();
        assert_eq!(order, vec!["Base", "Timestamped", "Auditable"]);
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let graph = DependencyGraph::from_traits([
            node("Zeta", &[]),
            node("Alpha", &[]),
            node("Mid", &["Zeta"]),
            node("Beta", &[]),
        ]);
        let order = topological_sort(&graph).unwrap();
        assert_eq!(order, vec!["Zeta", "Alpha", "Mid", "Beta"]);
        assert_eq!(order, topological_sort(&graph).unwrap());
    }

    #[test]
    fn test_released_node_waits_for_earlier_ready_nodes() {
        // C becomes ready after A, but B was registered before C.
        let graph = DependencyGraph::from_traits([
            node("A", &[]),
            node("B", &["A"]),
            node("C", &["A"]),
            node("D", &[]),
        ]);
        let order = topological_sort(&graph).unwrap();
        assert_eq!(order, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_conflicts_do_not_affect_order() {
        let graph = DependencyGraph::from_traits([
            node("B", &[]).conflicts_with("A"),
            node("A", &[]),
        ]);
        assert_eq!(topological_sort(&graph).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_cycle_reports_cycle_members() {
        let graph = DependencyGraph::from_traits([
            node("Root", &[]),
            node("A", &["B", "Root"]),
            node("B", &["A"]),
        ]);
        let errors = topological_sort(&graph).unwrap_err();
        assert_eq!(
            errors,
            vec![CompositionError::CircularDependency {
                cycle: vec!["A".to_string(), "B".to_string()],
                members: vec!["A".to_string(), "B".to_string()],
            }]
        );
    }

    #[test]
    fn test_validate_and_sort_collects_all_problems() {
        let graph = DependencyGraph::from_traits([
            node("A", &["Ghost"]),
            node("B", &["C"]),
            node("C", &["B"]),
        ]);
        let errors = validate_and_sort(&graph).unwrap_err();
        let kinds: Vec<ErrorKind> = errors.iter().map(CompositionError::kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::MissingDependency, ErrorKind::CircularDependency]
        );
    }

    #[test]
    fn test_validate_and_sort_happy_path() {
        let graph = DependencyGraph::from_traits([node("A", &[]), node("B", &["A"])]);
        assert_eq!(validate_and_sort(&graph).unwrap(), vec!["A", "B"]);
    }
}
