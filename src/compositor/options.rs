// Copyright 2025 Cowboy AI, LLC.

//! Compositor configuration

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Caller-chosen resolution for collisions on one field
///
/// Serialized as `{"strategy": "prefer_trait", "trait": "X"}`,
/// `{"strategy": "prefer_stricter"}` or `{"strategy": "default"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CollisionResolutionPolicy {
    /// Take the named trait's full definition regardless of order
    PreferTrait {
        /// Trait whose definition wins
        #[serde(rename = "trait")]
        trait_name: String,
    },
    /// Stricter value for every constraint, enum sets intersected
    PreferStricter,
    /// Automatic resolution
    Default,
}

impl CollisionResolutionPolicy {
    /// Policy preferring one trait
    pub fn prefer_trait(trait_name: impl Into<String>) -> Self {
        CollisionResolutionPolicy::PreferTrait {
            trait_name: trait_name.into(),
        }
    }
}

/// Options controlling a composition pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositorOptions {
    /// Field name to resolution policy
    pub collision_resolutions: IndexMap<String, CollisionResolutionPolicy>,
    /// Let the last declaring trait own the state machine instead of failing
    pub allow_multiple_state_machines: bool,
    /// Fail when any warning was recorded
    pub strict_mode: bool,
    /// Attach elapsed time to the result metadata
    pub track_performance: bool,
}

impl CompositorOptions {
    /// Parse options from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the policy for one field
    pub fn with_resolution(
        mut self,
        field: impl Into<String>,
        policy: CollisionResolutionPolicy,
    ) -> Self {
        self.collision_resolutions.insert(field.into(), policy);
        self
    }

    /// Allow several traits to declare a state machine
    pub fn with_multiple_state_machines(mut self, allow: bool) -> Self {
        self.allow_multiple_state_machines = allow;
        self
    }

    /// Toggle strict mode
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Toggle timing
    pub fn with_performance_tracking(mut self, track: bool) -> Self {
        self.track_performance = track;
        self
    }

    /// Policy for a field, if any
    pub fn resolution_for(&self, field: &str) -> Option<&CollisionResolutionPolicy> {
        self.collision_resolutions.get(field)
    }
}
