// Copyright 2025 Cowboy AI, LLC.

//! Trait compositor
//!
//! Merges an ordered list of trait definitions, optionally on top of a base
//! object, into one [`CompositionResult`]. The order is trusted as given;
//! producing it is the sorter's job.
//!
//! ```mermaid
//! graph LR
//!     B[Base object, layer 0] --> T1[Trait 1]
//!     T1 --> T2[Trait 2]
//!     T2 --> TN[Trait N]
//!     TN --> R[CompositionResult]
//! ```

pub mod options;
pub mod result;

mod merge;
mod report;

pub use options::{CollisionResolutionPolicy, CompositorOptions};
pub use report::generate_report;
pub use result::{
    CollisionRecord, ComposedStateMachine, CompositionMetadata, CompositionResult,
    FieldProvenance, PerformanceMetrics, ResolutionPath,
};

use chrono::Utc;
use indexmap::IndexMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::definition::{
    ActionDescriptor, BaseObjectDefinition, SemanticDescriptor, TraitDefinition, ViewExtension,
};
use crate::errors::{CompositionError, CompositionFailure, CompositionWarning};
use crate::field::FieldDefinition;
use merge::{resolve_collision, Contribution};

/// Merges ordered trait layers into a composed object definition
#[derive(Debug, Clone, Default)]
pub struct TraitCompositor {
    options: CompositorOptions,
}

impl TraitCompositor {
    /// Compositor with the given options
    pub fn new(options: CompositorOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &CompositorOptions {
        &self.options
    }

    /// Compose traits in the given order on top of an optional base object
    ///
    /// A type mismatch aborts immediately. State machine ownership errors are
    /// collected and reported after all layers ran. Warnings accumulate and
    /// only fail the composition in strict mode.
    pub fn compose(
        &self,
        traits: &[TraitDefinition],
        base: Option<&BaseObjectDefinition>,
    ) -> Result<CompositionResult, CompositionFailure> {
        if traits.is_empty() && base.is_none() {
            return Err(CompositionFailure::from_errors(vec![
                CompositionError::EmptyComposition,
            ]));
        }

        let started = Instant::now();
        let mut state = LayerState::default();

        if let Some(base) = base {
            debug!(base = %base.name, fields = base.schema.len(), "Composing base object");
            if let Err(error) = state.merge_schema(&base.name, 0, &base.schema, &self.options) {
                return Err(state.fail(error));
            }
        }

        for (position, definition) in traits.iter().enumerate() {
            let layer = position + 1;
            debug!(
                trait_name = %definition.name,
                version = %definition.version,
                layer,
                fields = definition.schema.len(),
                "Composing trait layer"
            );

            if let Err(error) =
                state.merge_schema(&definition.name, layer, &definition.schema, &self.options)
            {
                return Err(state.fail(error));
            }
            state.merge_semantics(definition);
            state.merge_view_extensions(definition);
            state.merge_tokens(definition);
            state.merge_actions(definition);
            state.merge_state_machine(definition, self.options.allow_multiple_state_machines);
            state.trait_order.push(definition.name.clone());
        }

        for extensions in state.view_extensions.values_mut() {
            extensions.sort_by_key(|extension| extension.priority);
        }

        if !state.errors.is_empty() {
            let errors = std::mem::take(&mut state.errors);
            return Err(CompositionFailure {
                errors,
                warnings: state.warnings,
            });
        }

        if self.options.strict_mode && !state.warnings.is_empty() {
            warn!(
                warnings = state.warnings.len(),
                "Strict mode rejected composition with warnings"
            );
            return Err(CompositionFailure {
                errors: vec![CompositionError::StrictModeWarnings {
                    warning_count: state.warnings.len(),
                }],
                warnings: state.warnings,
            });
        }

        let performance = self.options.track_performance.then(|| PerformanceMetrics {
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            layers: traits.len() + usize::from(base.is_some()),
        });

        let result = state.finish(performance);
        info!(
            traits = result.metadata.trait_count,
            fields = result.metadata.field_count,
            collisions = result.metadata.collisions.len(),
            warnings = result.metadata.warnings.len(),
            "Composition complete"
        );
        Ok(result)
    }

    /// Human-readable summary of a composition
    pub fn generate_report(&self, result: &CompositionResult) -> String {
        generate_report(result)
    }
}

/// Accumulated state while layers are applied
#[derive(Default)]
struct LayerState {
    schema: IndexMap<String, FieldDefinition>,
    provenance: IndexMap<String, FieldProvenance>,
    collisions: IndexMap<String, CollisionRecord>,
    semantics: IndexMap<String, SemanticDescriptor>,
    view_extensions: IndexMap<String, Vec<ViewExtension>>,
    tokens: IndexMap<String, String>,
    actions: Vec<ActionDescriptor>,
    state_machine: Option<ComposedStateMachine>,
    trait_order: Vec<String>,
    warnings: Vec<CompositionWarning>,
    errors: Vec<CompositionError>,
}

impl LayerState {
    fn merge_schema(
        &mut self,
        source: &str,
        layer: usize,
        fields: &IndexMap<String, FieldDefinition>,
        options: &CompositorOptions,
    ) -> Result<(), CompositionError> {
        for (name, incoming) in fields {
            let Some(existing) = self.schema.get(name) else {
                self.schema.insert(name.clone(), incoming.clone());
                self.provenance.insert(
                    name.clone(),
                    FieldProvenance {
                        source: source.to_string(),
                        layer,
                        previous_sources: Vec::new(),
                        overridden: false,
                    },
                );
                continue;
            };

            let previous_source = self
                .provenance
                .get(name)
                .map(|p| p.source.clone())
                .unwrap_or_default();
            let resolution = resolve_collision(
                name,
                Contribution {
                    source: &previous_source,
                    field: existing,
                },
                Contribution {
                    source,
                    field: incoming,
                },
                options.resolution_for(name),
            )?;

            for note in resolution.notes {
                let warning = CompositionWarning::for_field(name.clone(), source, note);
                warn!(%warning, "Composition warning");
                self.warnings.push(warning);
            }

            let provenance = self
                .provenance
                .entry(name.clone())
                .or_insert_with(|| FieldProvenance {
                    source: previous_source.clone(),
                    layer,
                    previous_sources: Vec::new(),
                    overridden: false,
                });
            if resolution.incoming_wins {
                provenance.previous_sources.push(previous_source.clone());
                provenance.source = source.to_string();
                provenance.layer = layer;
            } else {
                provenance.previous_sources.push(source.to_string());
            }
            provenance.overridden = true;
            let winner = provenance.source.clone();

            let record = self
                .collisions
                .entry(name.clone())
                .or_insert_with(|| CollisionRecord {
                    field: name.clone(),
                    sources: vec![previous_source],
                    resolution: ResolutionPath::Automatic,
                    winner: String::new(),
                });
            record.sources.push(source.to_string());
            record.resolution = resolution.path;
            record.winner = winner;

            debug!(field = %name, source, winner = %record.winner, "Resolved field collision");
            self.schema.insert(name.clone(), resolution.field);
        }
        Ok(())
    }

    fn merge_semantics(&mut self, definition: &TraitDefinition) {
        for (field, semantic) in &definition.semantics {
            if self.semantics.insert(field.clone(), semantic.clone()).is_some() {
                debug!(field = %field, trait_name = %definition.name, "Semantic descriptor replaced");
            }
        }
    }

    fn merge_view_extensions(&mut self, definition: &TraitDefinition) {
        for (context, extensions) in &definition.view_extensions {
            let merged = self.view_extensions.entry(context.clone()).or_default();
            merged.extend(extensions.iter().cloned().map(|mut extension| {
                extension
                    .source
                    .get_or_insert_with(|| definition.name.clone());
                extension
            }));
        }
    }

    fn merge_tokens(&mut self, definition: &TraitDefinition) {
        for (key, value) in &definition.tokens {
            if let Some(previous) = self.tokens.insert(key.clone(), value.clone()) {
                debug!(token = %key, %previous, trait_name = %definition.name, "Design token overwritten");
            }
        }
    }

    fn merge_actions(&mut self, definition: &TraitDefinition) {
        for action in &definition.actions {
            match self.actions.iter_mut().find(|a| a.name == action.name) {
                Some(slot) => {
                    debug!(action = %action.name, trait_name = %definition.name, "Action replaced");
                    *slot = action.clone();
                }
                None => self.actions.push(action.clone()),
            }
        }
    }

    fn merge_state_machine(&mut self, definition: &TraitDefinition, allow_multiple: bool) {
        let Some(machine) = &definition.state_machine else {
            return;
        };
        match &self.state_machine {
            Some(current) if !allow_multiple => {
                let error = CompositionError::MultipleStateMachines {
                    first_owner: current.owner_trait.clone(),
                    second_owner: definition.name.clone(),
                };
                warn!(%error, "State machine ownership conflict");
                self.errors.push(error);
            }
            current => {
                if let Some(current) = current {
                    debug!(
                        previous_owner = %current.owner_trait,
                        owner = %definition.name,
                        "State machine ownership transferred"
                    );
                }
                self.state_machine = Some(ComposedStateMachine {
                    owner_trait: definition.name.clone(),
                    definition: machine.clone(),
                });
            }
        }
    }

    fn fail(&mut self, error: CompositionError) -> CompositionFailure {
        warn!(%error, "Composition aborted");
        let mut errors = std::mem::take(&mut self.errors);
        errors.push(error);
        CompositionFailure {
            errors,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn finish(self, performance: Option<PerformanceMetrics>) -> CompositionResult {
        let trait_count = self.trait_order.len();
        let field_count = self.schema.len();
        CompositionResult {
            schema: self.schema,
            semantics: self.semantics,
            view_extensions: self.view_extensions,
            tokens: self.tokens,
            actions: self.actions,
            state_machine: self.state_machine,
            metadata: CompositionMetadata {
                composition_id: Uuid::new_v4(),
                composed_at: Utc::now(),
                trait_order: self.trait_order,
                trait_count,
                field_count,
                collisions: self.collisions.into_values().collect(),
                warnings: self.warnings,
                provenance: self.provenance,
                performance,
            },
        }
    }
}
