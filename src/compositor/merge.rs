// Copyright 2025 Cowboy AI, LLC.

//! Field collision resolution
//!
//! Type mismatches are fatal and checked before any policy. An explicit
//! policy for the field is applied next; otherwise the automatic merge runs:
//! `required` is OR'd, bounds take the stricter value, enum sets are unioned,
//! everything else follows the incoming layer.

use crate::compositor::options::CollisionResolutionPolicy;
use crate::compositor::result::ResolutionPath;
use crate::errors::CompositionError;
use crate::field::{EnumMerge, FieldDefinition, MergeNote};

/// One side of a collision
pub(crate) struct Contribution<'a> {
    pub source: &'a str,
    pub field: &'a FieldDefinition,
}

/// Outcome of resolving one collision
#[derive(Debug)]
pub(crate) struct Resolution {
    pub field: FieldDefinition,
    /// True when the incoming layer takes ownership
    pub incoming_wins: bool,
    pub path: ResolutionPath,
    /// Warning messages for the incoming layer
    pub notes: Vec<String>,
}

pub(crate) fn resolve_collision(
    name: &str,
    existing: Contribution<'_>,
    incoming: Contribution<'_>,
    policy: Option<&CollisionResolutionPolicy>,
) -> Result<Resolution, CompositionError> {
    if !existing.field.is_type_compatible(incoming.field) {
        return Err(CompositionError::TypeMismatch {
            field: name.to_string(),
            existing_type: existing.field.field_type.clone(),
            existing_source: existing.source.to_string(),
            incoming_type: incoming.field.field_type.clone(),
            incoming_source: incoming.source.to_string(),
        });
    }

    match policy {
        Some(CollisionResolutionPolicy::PreferTrait { trait_name }) if trait_name == incoming.source => {
            Ok(Resolution {
                field: incoming.field.clone(),
                incoming_wins: true,
                path: ResolutionPath::PreferTrait {
                    trait_name: trait_name.clone(),
                },
                notes: Vec::new(),
            })
        }
        Some(CollisionResolutionPolicy::PreferTrait { trait_name }) if trait_name == existing.source => {
            Ok(Resolution {
                field: existing.field.clone(),
                incoming_wins: false,
                path: ResolutionPath::PreferTrait {
                    trait_name: trait_name.clone(),
                },
                notes: Vec::new(),
            })
        }
        Some(CollisionResolutionPolicy::PreferStricter) => {
            let mut notes = Vec::new();
            let field = merge_fields(existing.field, incoming.field, EnumMerge::Intersect, &mut notes);
            Ok(Resolution {
                field,
                incoming_wins: true,
                path: ResolutionPath::PreferStricter,
                notes,
            })
        }
        // Preferred trait not involved yet: merge automatically until it arrives.
        Some(CollisionResolutionPolicy::PreferTrait { .. })
        | Some(CollisionResolutionPolicy::Default)
        | None => {
            let mut notes = Vec::new();
            let field = merge_fields(existing.field, incoming.field, EnumMerge::Union, &mut notes);
            Ok(Resolution {
                field,
                incoming_wins: true,
                path: ResolutionPath::Automatic,
                notes,
            })
        }
    }
}

fn merge_fields(
    existing: &FieldDefinition,
    incoming: &FieldDefinition,
    enum_merge: EnumMerge,
    notes: &mut Vec<String>,
) -> FieldDefinition {
    if existing.required != incoming.required {
        notes.push(format!(
            "required mismatch (earlier: {}, incoming: {}) resolved to required",
            existing.required, incoming.required
        ));
    }

    let default = match (&existing.default, &incoming.default) {
        (Some(previous), Some(current)) => {
            if previous != current {
                notes.push(format!("default {previous} replaced by {current}"));
            }
            Some(current.clone())
        }
        (previous, None) => previous.clone(),
        (None, current) => current.clone(),
    };

    let (validation, merge_notes) = existing.validation.merge(&incoming.validation, enum_merge);
    for note in merge_notes {
        notes.push(match note {
            MergeNote::PatternReplaced { previous, current } => {
                format!("pattern '{previous}' replaced by '{current}'")
            }
            MergeNote::EmptyEnumIntersection => {
                String::from("enum sets have no common value; incoming set kept")
            }
            MergeNote::UnsatisfiableBounds { kind, min, max } => {
                format!("{kind} bounds exclude every value: min {min} > max {max}")
            }
        });
    }

    let description = if incoming.description.is_empty() {
        existing.description.clone()
    } else {
        incoming.description.clone()
    };

    FieldDefinition {
        field_type: existing.field_type.clone(),
        required: existing.required || incoming.required,
        default,
        validation,
        description,
    }
}
