// Copyright 2025 Cowboy AI, LLC.

//! Field definitions and validation rules
//!
//! Validation is a closed set of rule kinds rather than an open property bag,
//! so every merge rule below is an exhaustive match over [`ValidationRule`].
//!
//! ```mermaid
//! graph LR
//!     F[FieldDefinition] --> T[FieldType]
//!     F --> V[FieldValidation]
//!     V --> L[Length]
//!     V --> R[Range]
//!     V --> E[Enum]
//!     V --> P[Pattern]
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Type tag of a field
///
/// Two fields are type-compatible only when their tags are identical,
/// including the payload of `Reference` and `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// Floating point number
    Number,
    /// Whole number
    Integer,
    /// true/false
    Boolean,
    /// Calendar date
    Date,
    /// Timestamp
    DateTime,
    /// UUID identifier
    Uuid,
    /// Nested object
    Object,
    /// List of values
    Array,
    /// Reference to another object definition
    Reference(String),
    /// Host-specific type
    Custom(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Number => f.write_str("number"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Date => f.write_str("date"),
            FieldType::DateTime => f.write_str("date_time"),
            FieldType::Uuid => f.write_str("uuid"),
            FieldType::Object => f.write_str("object"),
            FieldType::Array => f.write_str("array"),
            FieldType::Reference(target) => write!(f, "reference({target})"),
            FieldType::Custom(name) => write!(f, "custom({name})"),
        }
    }
}

/// Kind of a validation rule; a field carries at most one rule per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// String/array length bounds
    Length,
    /// Numeric bounds
    Range,
    /// Allowed value set
    Enum,
    /// Regular expression
    Pattern,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::Length => f.write_str("length"),
            ValidationKind::Range => f.write_str("range"),
            ValidationKind::Enum => f.write_str("enum"),
            ValidationKind::Pattern => f.write_str("pattern"),
        }
    }
}

/// One validation constraint on a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Length bounds
    Length {
        /// Minimum length
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        /// Maximum length
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Numeric bounds
    Range {
        /// Lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Allowed values
    Enum {
        /// Value set, no duplicates after any merge
        values: Vec<Value>,
    },
    /// Pattern the value must match
    Pattern {
        /// Regular expression source
        regex: String,
    },
}

impl ValidationRule {
    /// Length rule
    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        ValidationRule::Length { min, max }
    }

    /// Numeric range rule
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        ValidationRule::Range { min, max }
    }

    /// Enum rule from anything convertible to JSON values
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut set: Vec<Value> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !set.contains(&value) {
                set.push(value);
            }
        }
        ValidationRule::Enum { values: set }
    }

    /// Pattern rule
    pub fn pattern(regex: impl Into<String>) -> Self {
        ValidationRule::Pattern {
            regex: regex.into(),
        }
    }

    /// The kind of this rule
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationRule::Length { .. } => ValidationKind::Length,
            ValidationRule::Range { .. } => ValidationKind::Range,
            ValidationRule::Enum { .. } => ValidationKind::Enum,
            ValidationRule::Pattern { .. } => ValidationKind::Pattern,
        }
    }
}

/// How enum sets combine when both sides declare one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMerge {
    /// Deduplicated union (automatic resolution)
    Union,
    /// Intersection (prefer-stricter resolution)
    Intersect,
}

/// Something a validation merge resolved that callers may want to report
#[derive(Debug, Clone, PartialEq)]
pub enum MergeNote {
    /// Both sides declared different patterns; the incoming one was kept
    PatternReplaced {
        /// Pattern that was dropped
        previous: String,
        /// Pattern now in effect
        current: String,
    },
    /// Enum intersection was empty; the incoming set was kept
    EmptyEnumIntersection,
    /// Combined bounds exclude every value
    UnsatisfiableBounds {
        /// Length or range
        kind: ValidationKind,
        /// Merged lower bound
        min: String,
        /// Merged upper bound
        max: String,
    },
}

/// Validation rules of a field, at most one per [`ValidationKind`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldValidation {
    rules: Vec<ValidationRule>,
}

impl FieldValidation {
    /// No rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing any existing rule of the same kind
    pub fn with(mut self, rule: ValidationRule) -> Self {
        self.set(rule);
        self
    }

    /// Insert or replace the rule of this kind
    pub fn set(&mut self, rule: ValidationRule) {
        match self.rules.iter_mut().find(|r| r.kind() == rule.kind()) {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
    }

    /// Rule of the given kind
    pub fn get(&self, kind: ValidationKind) -> Option<&ValidationRule> {
        self.rules.iter().find(|r| r.kind() == kind)
    }

    /// All rules in declaration order
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// True when no rule is declared
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Allowed values, if an enum rule exists
    pub fn enum_values(&self) -> Option<&[Value]> {
        match self.get(ValidationKind::Enum) {
            Some(ValidationRule::Enum { values }) => Some(values),
            _ => None,
        }
    }

    /// Length bounds, if declared
    pub fn length_bounds(&self) -> Option<(Option<usize>, Option<usize>)> {
        match self.get(ValidationKind::Length) {
            Some(ValidationRule::Length { min, max }) => Some((*min, *max)),
            _ => None,
        }
    }

    /// Numeric bounds, if declared
    pub fn range_bounds(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self.get(ValidationKind::Range) {
            Some(ValidationRule::Range { min, max }) => Some((*min, *max)),
            _ => None,
        }
    }

    /// Pattern, if declared
    pub fn pattern(&self) -> Option<&str> {
        match self.get(ValidationKind::Pattern) {
            Some(ValidationRule::Pattern { regex }) => Some(regex),
            _ => None,
        }
    }

    /// Merge an incoming layer's rules into these
    ///
    /// Bounds take the stricter value per bound, enums combine per `enum_merge`,
    /// patterns follow the incoming layer. Kinds present on one side only are kept.
    pub fn merge(&self, incoming: &FieldValidation, enum_merge: EnumMerge) -> (Self, Vec<MergeNote>) {
        let mut merged = Vec::with_capacity(self.rules.len() + incoming.rules.len());
        let mut notes = Vec::new();

        for rule in &self.rules {
            let combined = match incoming.get(rule.kind()) {
                Some(other) => merge_rule(rule, other, enum_merge, &mut notes),
                None => rule.clone(),
            };
            merged.push(combined);
        }
        for rule in &incoming.rules {
            if self.get(rule.kind()).is_none() {
                merged.push(rule.clone());
            }
        }

        (Self { rules: merged }, notes)
    }
}

fn merge_rule(
    existing: &ValidationRule,
    incoming: &ValidationRule,
    enum_merge: EnumMerge,
    notes: &mut Vec<MergeNote>,
) -> ValidationRule {
    match (existing, incoming) {
        (
            ValidationRule::Length { min: a_min, max: a_max },
            ValidationRule::Length { min: b_min, max: b_max },
        ) => {
            let min = stricter(*a_min, *b_min, usize::max);
            let max = stricter(*a_max, *b_max, usize::min);
            check_bounds(ValidationKind::Length, min, max, notes);
            ValidationRule::Length { min, max }
        }
        (
            ValidationRule::Range { min: a_min, max: a_max },
            ValidationRule::Range { min: b_min, max: b_max },
        ) => {
            let min = stricter(*a_min, *b_min, f64::max);
            let max = stricter(*a_max, *b_max, f64::min);
            check_bounds(ValidationKind::Range, min, max, notes);
            ValidationRule::Range { min, max }
        }
        (ValidationRule::Enum { values: a }, ValidationRule::Enum { values: b }) => {
            match enum_merge {
                EnumMerge::Union => {
                    let mut values = a.clone();
                    for value in b {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                    ValidationRule::Enum { values }
                }
                EnumMerge::Intersect => {
                    let values: Vec<Value> = a.iter().filter(|v| b.contains(v)).cloned().collect();
                    if values.is_empty() {
                        notes.push(MergeNote::EmptyEnumIntersection);
                        ValidationRule::Enum { values: b.clone() }
                    } else {
                        ValidationRule::Enum { values }
                    }
                }
            }
        }
        (ValidationRule::Pattern { regex: a }, ValidationRule::Pattern { regex: b }) => {
            if a != b {
                notes.push(MergeNote::PatternReplaced {
                    previous: a.clone(),
                    current: b.clone(),
                });
            }
            ValidationRule::Pattern { regex: b.clone() }
        }
        // Callers only pair rules of the same kind.
        _ => incoming.clone(),
    }
}

fn check_bounds<T: PartialOrd + fmt::Display>(
    kind: ValidationKind,
    min: Option<T>,
    max: Option<T>,
    notes: &mut Vec<MergeNote>,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            notes.push(MergeNote::UnsatisfiableBounds {
                kind,
                min: min.to_string(),
                max: max.to_string(),
            });
        }
    }
}

fn stricter<T>(a: Option<T>, b: Option<T>, pick: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Definition of one schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    /// Type tag
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether a value must be present
    #[serde(default)]
    pub required: bool,
    /// Default literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Validation rules
    #[serde(default, skip_serializing_if = "FieldValidation::is_empty")]
    pub validation: FieldValidation,
    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldDefinition {
    /// Optional field of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            validation: FieldValidation::new(),
            description: String::new(),
        }
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default literal
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Add a validation rule
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.set(rule);
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Identical type tags
    pub fn is_type_compatible(&self, other: &FieldDefinition) -> bool {
        self.field_type == other.field_type
    }
}
