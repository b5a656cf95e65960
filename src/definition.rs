// Copyright 2025 Cowboy AI, LLC.

//! Trait and base object definitions
//!
//! A [`TraitDefinition`] is an immutable, named and versioned bundle of schema
//! fields plus auxiliary metadata (semantics, view extensions, design tokens,
//! actions and an optional state machine). Definitions arrive already parsed;
//! this crate never reads them from disk.

use indexmap::{IndexMap, IndexSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::FieldDefinition;

/// Semantic meaning attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SemanticDescriptor {
    /// Semantic category, e.g. `identifier`, `timestamp`, `email`
    pub category: String,
    /// Optional explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extra host-defined attributes
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
}

impl SemanticDescriptor {
    /// Descriptor with only a category
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: None,
            attributes: IndexMap::new(),
        }
    }
}

/// UI extension contributed to a named view context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViewExtension {
    /// Component identifier
    pub component: String,
    /// Placement hint, e.g. `header`, `sidebar`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Ordering key, ascending
    #[serde(default)]
    pub priority: i32,
    /// Trait that contributed this extension; filled in during composition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ViewExtension {
    /// Extension with a priority and no position
    pub fn new(component: impl Into<String>, priority: i32) -> Self {
        Self {
            component: component.into(),
            position: None,
            priority,
            source: None,
        }
    }

    /// Set the placement hint
    pub fn at(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// Named operation exposed by a trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionDescriptor {
    /// Unique action name
    pub name: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form intent or handler reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl ActionDescriptor {
    /// Action with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            intent: None,
        }
    }
}

/// One allowed transition of a lifecycle state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateTransition {
    /// Source state
    pub from: String,
    /// Target state
    pub to: String,
    /// Triggering event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
}

/// Lifecycle model a trait can contribute to the composed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateMachineDefinition {
    /// Declared states
    pub states: Vec<String>,
    /// Starting state
    pub initial: String,
    /// Allowed transitions
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
}

impl StateMachineDefinition {
    /// Machine with states and initial state, no transitions yet
    pub fn new<I, S>(states: I, initial: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            initial: initial.into(),
            transitions: Vec::new(),
        }
    }

    /// Add a transition
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        on: Option<&str>,
    ) -> Self {
        self.transitions.push(StateTransition {
            from: from.into(),
            to: to.into(),
            on: on.map(str::to_string),
        });
        self
    }
}

/// A named, versioned bundle of fields and metadata that composes into objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TraitDefinition {
    /// Unique key
    pub name: String,
    /// Version label
    pub version: String,
    /// Field name to definition
    #[serde(default)]
    pub schema: IndexMap<String, FieldDefinition>,
    /// Traits that must be composed before this one
    #[serde(default)]
    pub dependencies: IndexSet<String>,
    /// Traits that may never be composed together with this one
    #[serde(default)]
    pub conflicts: IndexSet<String>,
    /// Field name to semantic descriptor
    #[serde(default)]
    pub semantics: IndexMap<String, SemanticDescriptor>,
    /// View context to extensions
    #[serde(default)]
    pub view_extensions: IndexMap<String, Vec<ViewExtension>>,
    /// Design tokens
    #[serde(default)]
    pub tokens: IndexMap<String, String>,
    /// Exposed actions
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
    /// Optional lifecycle model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_machine: Option<StateMachineDefinition>,
}

impl TraitDefinition {
    /// Empty trait
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            schema: IndexMap::new(),
            dependencies: IndexSet::new(),
            conflicts: IndexSet::new(),
            semantics: IndexMap::new(),
            view_extensions: IndexMap::new(),
            tokens: IndexMap::new(),
            actions: Vec::new(),
            state_machine: None,
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDefinition) -> Self {
        self.schema.insert(name.into(), field);
        self
    }

    /// Declare a dependency
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Declare a conflict
    pub fn conflicts_with(mut self, name: impl Into<String>) -> Self {
        self.conflicts.insert(name.into());
        self
    }

    /// Attach a semantic descriptor to a field
    pub fn with_semantic(mut self, field: impl Into<String>, semantic: SemanticDescriptor) -> Self {
        self.semantics.insert(field.into(), semantic);
        self
    }

    /// Contribute a view extension to a context
    pub fn with_view_extension(mut self, context: impl Into<String>, extension: ViewExtension) -> Self {
        self.view_extensions
            .entry(context.into())
            .or_default()
            .push(extension);
        self
    }

    /// Add a design token
    pub fn with_token(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens.insert(key.into(), value.into());
        self
    }

    /// Add an action
    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the state machine
    pub fn with_state_machine(mut self, machine: StateMachineDefinition) -> Self {
        self.state_machine = Some(machine);
        self
    }
}

/// Optional zeroth layer composed before every trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BaseObjectDefinition {
    /// Object identifier
    pub id: String,
    /// Object name, used as the layer's source label
    pub name: String,
    /// Base fields
    #[serde(default)]
    pub schema: IndexMap<String, FieldDefinition>,
}

impl BaseObjectDefinition {
    /// Base object without fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: IndexMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDefinition) -> Self {
        self.schema.insert(name.into(), field);
        self
    }
}
