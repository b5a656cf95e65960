// Copyright 2025 Cowboy AI, LLC.

//! Dependency validation
//!
//! Checks that a graph, or a requested subset of it, can be composed at all:
//! every edge target must be registered and no composition may require two
//! traits joined by a conflict edge. Ordering is the sorter's concern.

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::errors::{CompositionError, GraphResult};
use crate::graph::DependencyGraph;

/// Read-only validator over a [`DependencyGraph`]
#[derive(Debug, Clone, Copy)]
pub struct DependencyValidator<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> DependencyValidator<'g> {
    /// Create a validator for a graph
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    /// Every dependency and conflict target must be a registered trait
    pub fn validate_dependencies_exist(&self) -> GraphResult<()> {
        let mut errors = Vec::new();
        for definition in self.graph.iter() {
            let targets = definition
                .dependencies
                .iter()
                .chain(definition.conflicts.iter());
            for target in targets {
                if !self.graph.has_trait(target) {
                    errors.push(CompositionError::MissingDependency {
                        dependent: Some(definition.name.clone()),
                        missing: target.clone(),
                    });
                }
            }
        }
        finish(errors)
    }

    /// Whole-graph conflict check over dependency closures
    ///
    /// For every registered trait `T`, the set `{T} ∪ closure(T)` must not
    /// contain both ends of any conflict edge. Each conflict edge is checked
    /// once against the traits that reach both of its ends, so the pass stays
    /// proportional to the number of conflict edges times the graph size.
    pub fn validate(&self) -> GraphResult<()> {
        let mut errors = Vec::new();
        for (first, second) in self.graph.conflict_pairs() {
            let reaches_first = self.graph.ancestors_inclusive(&first);
            let reaches_second = self.graph.ancestors_inclusive(&second);
            for name in self.graph.trait_names() {
                if reaches_first.contains(name) && reaches_second.contains(name) {
                    errors.push(CompositionError::Conflict {
                        trait_name: name.to_string(),
                        first: first.clone(),
                        second: second.clone(),
                    });
                }
            }
        }
        finish(errors)
    }

    /// Validate a requested composition and return its full member set
    ///
    /// The set is the requested names plus their transitive dependencies, in
    /// discovery order. Unregistered members are `missing_dependency` errors;
    /// any conflict edge between two members is a `conflict` error.
    pub fn validate_composition(&self, names: &[&str]) -> GraphResult<IndexSet<String>> {
        let mut errors = Vec::new();
        let mut members: IndexSet<String> = IndexSet::new();

        for name in names {
            if !self.graph.has_trait(name) {
                errors.push(CompositionError::MissingDependency {
                    dependent: None,
                    missing: name.to_string(),
                });
            }
            members.insert(name.to_string());
            members.extend(self.graph.get_transitive_dependencies(name));
        }

        for member in &members {
            for dependency in self.graph.get_dependencies(member) {
                if !self.graph.has_trait(&dependency) {
                    errors.push(CompositionError::MissingDependency {
                        dependent: Some(member.clone()),
                        missing: dependency,
                    });
                }
            }
        }

        let label = format!("[{}]", names.join(", "));
        for (position, member) in members.iter().enumerate() {
            for other in self.graph.get_conflicts(member) {
                match members.get_index_of(&other) {
                    Some(other_position) if other_position >= position => {
                        errors.push(CompositionError::Conflict {
                            trait_name: label.clone(),
                            first: member.clone(),
                            second: other,
                        });
                    }
                    _ => {}
                }
            }
        }

        debug!(
            requested = names.len(),
            members = members.len(),
            errors = errors.len(),
            "Validated requested composition"
        );
        finish(errors).map(|()| members)
    }

    /// Cheap pairwise check used before attempting a composition
    ///
    /// False when `a` and `b` share a conflict edge, or when a member of
    /// either one's dependency closure conflicts with the other.
    pub fn can_compose(&self, a: &str, b: &str) -> bool {
        if self.graph.has_conflict(a, b) {
            return false;
        }
        let closure_conflicts = |from: &str, with: &str| {
            self.graph
                .get_transitive_dependencies(from)
                .iter()
                .any(|member| self.graph.has_conflict(member, with))
        };
        !(closure_conflicts(a, b) || closure_conflicts(b, a))
    }
}

fn finish(errors: Vec<CompositionError>) -> GraphResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        warn!(%error, "Dependency validation failed");
    }
    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TraitDefinition;
    use crate::errors::ErrorKind;
    use pretty_assertions::assert_eq;

    fn node(name: &str, deps: &[&str]) -> TraitDefinition {
        deps.iter()
            .fold(TraitDefinition::new(name, "1.0.0"), |t, d| t.depends_on(*d))
    }

    #[test]
    fn test_missing_targets_name_both_sides() {
        let graph = DependencyGraph::from_traits([
            node("A", &["Ghost"]).conflicts_with("Phantom"),
            node("B", &["A"]),
        ]);
        let errors = DependencyValidator::new(&graph)
            .validate_dependencies_exist()
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                CompositionError::MissingDependency {
                    dependent: Some("A".to_string()),
                    missing: "Ghost".to_string(),
                },
                CompositionError::MissingDependency {
                    dependent: Some("A".to_string()),
                    missing: "Phantom".to_string(),
                },
            ]
        );
    }

    /// Test conflicts reached through a dependency chain
    ///
    /// ```mermaid
    /// graph TD
    ///     Publishable --> Draftable
    ///     Publishable --> Archivable
    ///     Archivable --> Immutable
    ///     Draftable -.-x Immutable
    /// ```
    #[test]
    fn test_validate_finds_transitive_conflict() {
        let graph = DependencyGraph::from_traits([
            node("Draftable", &[]).conflicts_with("Immutable"),
            node("Immutable", &[]),
            node("Archivable", &["Immutable"]),
            node("Publishable", &["Draftable", "Archivable"]),
        ]);
        let errors = DependencyValidator::new(&graph).validate().unwrap_err();
        assert_eq!(
            errors,
            vec![CompositionError::Conflict {
                trait_name: "Publishable".to_string(),
                first: "Draftable".to_string(),
                second: "Immutable".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_flags_trait_conflicting_with_own_dependency() {
        let graph = DependencyGraph::from_traits([
            node("Base", &[]),
            node("Mid", &["Base"]),
            node("Top", &["Mid"]).conflicts_with("Base"),
        ]);
        let errors = DependencyValidator::new(&graph).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompositionError::Conflict { trait_name, .. } if trait_name == "Top"
        ));
    }

    #[test]
    fn test_independent_conflicting_traits_are_valid_registry_entries() {
        let graph = DependencyGraph::from_traits([
            node("A", &[]).conflicts_with("B"),
            node("B", &[]),
        ]);
        assert!(DependencyValidator::new(&graph).validate().is_ok());
    }

    #[test]
    fn test_validate_composition_returns_closure() {
        let graph = DependencyGraph::from_traits([
            node("Base", &[]),
            node("Timestamped", &["Base"]),
            node("Auditable", &["Timestamped"]),
            node("Unrelated", &[]),
        ]);
        let members = DependencyValidator::new(&graph)
            .validate_composition(&["Auditable"])
            .unwrap();
        let names: Vec<&str> = members.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Auditable", "Timestamped", "Base"]);
    }

    #[test]
    fn test_validate_composition_reports_missing_and_conflicts() {
        let graph = DependencyGraph::from_traits([
            node("A", &["Ghost"]),
            node("B", &[]).conflicts_with("A"),
        ]);
        let errors = DependencyValidator::new(&graph)
            .validate_composition(&["A", "B", "Nope"])
            .unwrap_err();
        let kinds: Vec<ErrorKind> = errors.iter().map(CompositionError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::MissingDependency,
                ErrorKind::MissingDependency,
                ErrorKind::Conflict,
            ]
        );
        assert!(errors.contains(&CompositionError::MissingDependency {
            dependent: Some("A".to_string()),
            missing: "Ghost".to_string(),
        }));
    }

    #[test]
    fn test_can_compose() {
        let graph = DependencyGraph::from_traits([
            node("Draftable", &[]).conflicts_with("Immutable"),
            node("Immutable", &[]),
            node("Archivable", &["Immutable"]),
            node("Taggable", &[]),
        ]);
        let validator = DependencyValidator::new(&graph);
        assert!(!validator.can_compose("Draftable", "Immutable"));
        assert!(!validator.can_compose("Archivable", "Draftable"));
        assert!(!validator.can_compose("Draftable", "Archivable"));
        assert!(validator.can_compose("Taggable", "Draftable"));
        assert!(validator.can_compose("Archivable", "Taggable"));
    }
}
