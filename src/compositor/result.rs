// Copyright 2025 Cowboy AI, LLC.

//! Output of a composition pass

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definition::{ActionDescriptor, SemanticDescriptor, StateMachineDefinition, ViewExtension};
use crate::errors::CompositionWarning;
use crate::field::FieldDefinition;

/// Which layer owns a field and which layers it displaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldProvenance {
    /// Owning trait (or base object name)
    pub source: String,
    /// Layer of the owner, base object is 0
    pub layer: usize,
    /// Earlier owners, oldest first
    pub previous_sources: Vec<String>,
    /// True once any collision touched the field
    pub overridden: bool,
}

/// Resolution path applied to a collision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Explicit prefer-trait policy
    PreferTrait {
        /// Preferred trait
        #[serde(rename = "trait")]
        trait_name: String,
    },
    /// Explicit prefer-stricter policy
    PreferStricter,
    /// Automatic merge
    Automatic,
}

/// One field that received contributions from two or more layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CollisionRecord {
    /// Field name
    pub field: String,
    /// Contributing layers in composition order
    pub sources: Vec<String>,
    /// Path taken by the latest collision on this field
    pub resolution: ResolutionPath,
    /// Layer owning the field afterwards
    pub winner: String,
}

/// Timing of a composition pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Wall-clock duration in milliseconds
    pub duration_ms: f64,
    /// Layers processed, base object included
    pub layers: usize,
}

/// State machine of the composed object and the trait it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposedStateMachine {
    /// Declaring trait
    pub owner_trait: String,
    /// The machine itself
    #[serde(flatten)]
    pub definition: StateMachineDefinition,
}

/// Diagnostics attached to a composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompositionMetadata {
    /// Identifier of this composition pass
    pub composition_id: Uuid,
    /// When the pass finished
    pub composed_at: DateTime<Utc>,
    /// Trait names in the order they were applied
    pub trait_order: Vec<String>,
    /// Number of traits applied
    pub trait_count: usize,
    /// Number of fields in the composed schema
    pub field_count: usize,
    /// Fields contributed by two or more layers
    pub collisions: Vec<CollisionRecord>,
    /// Resolvable issues worth surfacing
    pub warnings: Vec<CompositionWarning>,
    /// Ownership history per field
    pub provenance: IndexMap<String, FieldProvenance>,
    /// Present when timing was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
}

/// A composed object definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResult {
    /// Merged fields
    pub schema: IndexMap<String, FieldDefinition>,
    /// Merged semantics
    pub semantics: IndexMap<String, SemanticDescriptor>,
    /// Per context, ascending by priority
    pub view_extensions: IndexMap<String, Vec<ViewExtension>>,
    /// Merged design tokens
    pub tokens: IndexMap<String, String>,
    /// Actions in layer order
    pub actions: Vec<ActionDescriptor>,
    /// Owned state machine, if any trait declared one
    pub state_machine: Option<ComposedStateMachine>,
    /// Diagnostics
    pub metadata: CompositionMetadata,
}

impl CompositionResult {
    /// Composed field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.schema.get(name)
    }

    /// Provenance of a field
    pub fn provenance_of(&self, name: &str) -> Option<&FieldProvenance> {
        self.metadata.provenance.get(name)
    }

    /// Collision record of a field
    pub fn collision_for(&self, name: &str) -> Option<&CollisionRecord> {
        self.metadata.collisions.iter().find(|c| c.field == name)
    }

    /// True when at least one field collided
    pub fn has_collisions(&self) -> bool {
        !self.metadata.collisions.is_empty()
    }
}
