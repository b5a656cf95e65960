// Copyright 2025 Cowboy AI, LLC.

//! # CIM Trait Compositor
//!
//! Composes object definitions from reusable traits.
//!
//! A trait is a named bundle of field definitions, semantics, view
//! extensions, design tokens, actions and at most one state machine, plus
//! declared dependencies on and conflicts with other traits. This crate:
//! - **DependencyGraph**: Registers traits with their dependency and conflict edges
//! - **Sorter**: Orders traits so every dependency composes before its dependents
//! - **DependencyValidator**: Checks a trait set for missing traits, cycles and conflicts
//! - **TraitCompositor**: Merges ordered traits into one definition with provenance
//! - **TraitComposer**: Runs validation, ordering and merging end to end
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Every ordering tie is broken by registration order
//! 2. **Collect, don't stop**: Validation reports every problem it finds at once
//! 3. **Provenance**: Every composed field knows which layer owns it and which it displaced
//!
//! ```mermaid
//! graph LR
//!     D[TraitDefinition] --> G[DependencyGraph]
//!     G --> V[DependencyValidator]
//!     G --> S[topological_sort]
//!     S --> C[TraitCompositor]
//!     C --> R[CompositionResult]
//!     R --> P[generate_report]
//! ```

#![warn(missing_docs)]

pub mod compositor;
pub mod definition;
pub mod errors;
pub mod field;
pub mod graph;
pub mod pipeline;
pub mod sorter;
pub mod validator;

pub use compositor::{
    generate_report, CollisionRecord, CollisionResolutionPolicy, ComposedStateMachine,
    CompositionMetadata, CompositionResult, CompositorOptions, FieldProvenance,
    PerformanceMetrics, ResolutionPath, TraitCompositor,
};
pub use definition::{
    ActionDescriptor, BaseObjectDefinition, SemanticDescriptor, StateMachineDefinition,
    StateTransition, TraitDefinition, ViewExtension,
};
pub use errors::{
    CompositionError, CompositionFailure, CompositionWarning, ErrorKind, GraphResult,
};
pub use field::{FieldDefinition, FieldType, FieldValidation, ValidationKind, ValidationRule};
pub use graph::DependencyGraph;
pub use pipeline::TraitComposer;
pub use sorter::{topological_sort, validate_and_sort};
pub use validator::DependencyValidator;
