// Copyright 2025 Cowboy AI, LLC.

//! Error types for trait composition
//!
//! Every failure the engine can report is a structured [`CompositionError`]
//! carrying a `type` tag plus the context needed to explain it. Graph, sorter
//! and validator operations return *all* detected problems at once through
//! [`GraphResult`]; the compositor returns a [`CompositionFailure`] that also
//! carries the warnings accumulated before it stopped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::field::FieldType;

/// Discriminant of a [`CompositionError`], serialized as its `type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A dependency or conflict target is not registered
    MissingDependency,
    /// A dependency cycle
    CircularDependency,
    /// Two mutually exclusive traits required together
    Conflict,
    /// Same field declared with different types
    TypeMismatch,
    /// More than one state machine owner
    MultipleStateMachines,
    /// Warnings present while strict mode is on
    StrictModeWarnings,
    /// Nothing to compose
    EmptyComposition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorKind::MissingDependency => "missing_dependency",
            ErrorKind::CircularDependency => "circular_dependency",
            ErrorKind::Conflict => "conflict",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::MultipleStateMachines => "multiple_state_machines",
            ErrorKind::StrictModeWarnings => "strict_mode_warnings",
            ErrorKind::EmptyComposition => "empty_composition",
        };
        f.write_str(tag)
    }
}

/// Errors that can occur while building, ordering, validating or composing traits
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositionError {
    /// A declared dependency is not a registered trait
    #[error("{}", describe_missing(.dependent.as_deref(), .missing))]
    MissingDependency {
        /// Trait declaring the edge, `None` when the name was requested directly
        dependent: Option<String>,
        /// Name that could not be resolved
        missing: String,
    },

    /// One strongly connected group of traits
    #[error("Circular dependency: {}", describe_cycle(.cycle, .members))]
    CircularDependency {
        /// A closed walk through the group, first member not repeated at the end
        cycle: Vec<String>,
        /// Every trait in the group, in registration order
        #[serde(default)]
        members: Vec<String>,
    },

    /// Two conflicting traits would be composed together
    #[error("Conflict in composition of '{trait_name}': '{first}' conflicts with '{second}'")]
    Conflict {
        /// Trait (or requested set) whose composition pulls in both sides
        trait_name: String,
        /// One side of the conflict edge
        first: String,
        /// Other side of the conflict edge
        second: String,
    },

    /// Two layers declare the same field with incompatible types
    #[error(
        "Type mismatch on field '{field}': '{existing_source}' declares {existing_type}, '{incoming_source}' declares {incoming_type}"
    )]
    TypeMismatch {
        /// Field name
        field: String,
        /// Type already in the composed schema
        existing_type: FieldType,
        /// Layer owning the existing definition
        existing_source: String,
        /// Type offered by the incoming layer
        incoming_type: FieldType,
        /// Incoming layer
        incoming_source: String,
    },

    /// A second trait declares a state machine while only one owner is allowed
    #[error("Multiple state machines: '{first_owner}' and '{second_owner}' both declare one")]
    MultipleStateMachines {
        /// Owner already recorded
        first_owner: String,
        /// Trait attempting to take ownership
        second_owner: String,
    },

    /// Strict mode turns any warning into a failure
    #[error("Composition produced {warning_count} warning(s) in strict mode")]
    StrictModeWarnings {
        /// How many warnings were recorded
        warning_count: usize,
    },

    /// No traits and no base object were supplied
    #[error("Nothing to compose: no traits and no base object")]
    EmptyComposition,
}

fn describe_missing(dependent: Option<&str>, missing: &str) -> String {
    match dependent {
        Some(dependent) => {
            format!("Missing dependency: '{dependent}' requires unregistered trait '{missing}'")
        }
        None => format!("Missing dependency: requested trait '{missing}' is not registered"),
    }
}

fn describe_cycle(cycle: &[String], members: &[String]) -> String {
    let walk = match cycle.first() {
        Some(first) => format!("{} -> {first}", cycle.join(" -> ")),
        None => String::from("<empty>"),
    };
    if members.len() > cycle.len() {
        format!("{walk} (strongly connected: {{{}}})", members.join(", "))
    } else {
        walk
    }
}

impl CompositionError {
    /// The `type` tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompositionError::MissingDependency { .. } => ErrorKind::MissingDependency,
            CompositionError::CircularDependency { .. } => ErrorKind::CircularDependency,
            CompositionError::Conflict { .. } => ErrorKind::Conflict,
            CompositionError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CompositionError::MultipleStateMachines { .. } => ErrorKind::MultipleStateMachines,
            CompositionError::StrictModeWarnings { .. } => ErrorKind::StrictModeWarnings,
            CompositionError::EmptyComposition => ErrorKind::EmptyComposition,
        }
    }

    /// Check if this error comes from graph structure rather than field merging
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            CompositionError::MissingDependency { .. }
                | CompositionError::CircularDependency { .. }
                | CompositionError::Conflict { .. }
        )
    }
}

/// Result type for graph, sorter and validator operations
pub type GraphResult<T> = Result<T, Vec<CompositionError>>;

/// A resolvable but notable event during composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositionWarning {
    /// Field the warning concerns, if any
    pub field: Option<String>,
    /// Layer that triggered it
    pub source: String,
    /// Human readable explanation
    pub message: String,
}

impl CompositionWarning {
    pub(crate) fn for_field(
        field: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            source: source.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CompositionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.source, field, self.message),
            None => write!(f, "[{}] {}", self.source, self.message),
        }
    }
}

/// Failed composition: every error plus the warnings gathered up to that point
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, JsonSchema)]
#[error("Composition failed: {}", summarize(.errors))]
pub struct CompositionFailure {
    /// Errors, in detection order
    pub errors: Vec<CompositionError>,
    /// Warnings recorded before failure
    pub warnings: Vec<CompositionWarning>,
}

fn summarize(errors: &[CompositionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CompositionFailure {
    /// Failure without warnings
    pub fn from_errors(errors: Vec<CompositionError>) -> Self {
        Self {
            errors,
            warnings: Vec::new(),
        }
    }

    /// Check if any error has the given kind
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl From<Vec<CompositionError>> for CompositionFailure {
    fn from(errors: Vec<CompositionError>) -> Self {
        Self::from_errors(errors)
    }
}
