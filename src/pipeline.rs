// Copyright 2025 Cowboy AI, LLC.

//! End-to-end composition over a caller-owned graph
//!
//! Runs the full control flow: validate the requested traits and their
//! dependency closure, order them deterministically, then merge them.
//!
//! ```mermaid
//! graph LR
//!     G[DependencyGraph] --> V[validate_composition]
//!     V --> S[topological_sort]
//!     S --> C[TraitCompositor::compose]
//!     C --> R[CompositionResult]
//! ```

use tracing::info;

use crate::compositor::{CompositionResult, CompositorOptions, TraitCompositor};
use crate::definition::{BaseObjectDefinition, TraitDefinition};
use crate::errors::CompositionFailure;
use crate::graph::DependencyGraph;
use crate::sorter::topological_sort;
use crate::validator::DependencyValidator;

/// Composes named traits from a graph in dependency order
#[derive(Debug, Clone, Default)]
pub struct TraitComposer {
    compositor: TraitCompositor,
}

impl TraitComposer {
    /// Composer using the given compositor options
    pub fn new(options: CompositorOptions) -> Self {
        Self {
            compositor: TraitCompositor::new(options),
        }
    }

    /// The underlying compositor
    pub fn compositor(&self) -> &TraitCompositor {
        &self.compositor
    }

    /// Order the requested traits and their dependencies without composing
    pub fn resolve_order(
        &self,
        graph: &DependencyGraph,
        names: &[&str],
    ) -> Result<Vec<String>, CompositionFailure> {
        let members = DependencyValidator::new(graph).validate_composition(names)?;
        let order = topological_sort(&graph.subgraph(members.iter().map(String::as_str)))?;
        Ok(order)
    }

    /// Validate, sort and compose the requested traits
    ///
    /// Validator and sorter failures are returned unchanged, with no warnings.
    pub fn compose(
        &self,
        graph: &DependencyGraph,
        names: &[&str],
        base: Option<&BaseObjectDefinition>,
    ) -> Result<CompositionResult, CompositionFailure> {
        let order = self.resolve_order(graph, names)?;
        let layers: Vec<TraitDefinition> = order
            .iter()
            .filter_map(|name| graph.get_trait(name).cloned())
            .collect();

        info!(
            requested = names.len(),
            layers = layers.len(),
            order = ?order,
            "Composing traits from graph"
        );
        self.compositor.compose(&layers, base)
    }
}
