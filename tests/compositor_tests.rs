//! Field merge, provenance and configuration scenarios


use cim_trait_compositor::{
    CollisionResolutionPolicy, CompositionError, CompositionResult, CompositorOptions, ErrorKind,
    FieldDefinition, FieldType, ResolutionPath, TraitCompositor, TraitDefinition, ValidationRule,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use serde_json::json;
use test_case::test_case;
use trait_fixtures::invoice_base;

fn single_field(trait_name: &str, field: &str, definition: FieldDefinition) -> TraitDefinition {
    TraitDefinition::new(trait_name, "1.0.0").with_field(field, definition)
}

#[test_case(FieldType::String, FieldType::Number ; "string then number")]
#[test_case(FieldType::Number, FieldType::String ; "number then string")]
fn test_age_type_mismatch_fails_in_either_order(first: FieldType, second: FieldType) {
    let a = single_field("Person", "age", FieldDefinition::new(first));
    let b = single_field("Legacy", "age", FieldDefinition::new(second));

    let failure = TraitCompositor::default().compose(&[a, b], None).unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    match &failure.errors[0] {
        CompositionError::TypeMismatch {
            field,
            existing_source,
            incoming_source,
            ..
        } => {
            assert_eq!(field, "age");
            assert_eq!(existing_source, "Person");
            assert_eq!(incoming_source, "Legacy");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn test_prefer_trait_does_not_rescue_a_type_mismatch() {
    let a = single_field("A", "age", FieldDefinition::new(FieldType::String));
    let b = single_field("B", "age", FieldDefinition::new(FieldType::Integer));
    let options = CompositorOptions::default()
        .with_resolution("age", CollisionResolutionPolicy::prefer_trait("B"));

    let failure = TraitCompositor::new(options).compose(&[a, b], None).unwrap_err();
    assert!(failure.has_kind(ErrorKind::TypeMismatch));
}

/// Test that required flags merge upward
///
/// ```mermaid
/// graph LR
///     A[Optional: email required=false] --> B[Mandatory: email required=true]
///     B --> R[email required=true, overridden]
/// ```
#[test]
fn test_required_false_then_true_is_required_and_overridden() {
    let a = single_field("Optional", "email", FieldDefinition::new(FieldType::String));
    let b = single_field("Mandatory", "email", FieldDefinition::new(FieldType::String).required());

    let result = TraitCompositor::default().compose(&[a, b], None).unwrap();
    assert!(result.field("email").unwrap().required);

    let provenance = result.provenance_of("email").unwrap();
    assert!(provenance.overridden);
    assert_eq!(provenance.source, "Mandatory");
    assert_eq!(provenance.previous_sources, vec!["Optional"]);
    assert_eq!(result.metadata.warnings.len(), 1);
    assert_eq!(result.metadata.warnings[0].source, "Mandatory");
    assert_eq!(result.metadata.warnings[0].field.as_deref(), Some("email"));
}

#[test_case(["a", "b"], ["b", "c"] ; "ab then bc")]
#[test_case(["b", "c"], ["a", "b"] ; "bc then ab")]
fn test_enum_union_has_three_values(first: [&str; 2], second: [&str; 2]) {
    let a = single_field("A", "status", FieldDefinition::new(FieldType::String).with_rule(ValidationRule::one_of(first)));
    let b = single_field("B", "status", FieldDefinition::new(FieldType::String).with_rule(ValidationRule::one_of(second)));

    let result = TraitCompositor::default().compose(&[a, b], None).unwrap();
    let values = result.field("status").unwrap().validation.enum_values().unwrap();
    assert_eq!(values.len(), 3);
    for expected in ["a", "b", "c"] {
        assert!(values.contains(&json!(expected)));
    }
}

fn enum_field(trait_name: &str, values: &BTreeSet<u8>) -> TraitDefinition {
    single_field(
        trait_name,
        "status",
        FieldDefinition::new(FieldType::Integer).with_rule(ValidationRule::one_of(values.iter().map(|v| json!(v)))),
    )
}

fn composed_enum(first: TraitDefinition, second: TraitDefinition) -> BTreeSet<String> {
    let result = TraitCompositor::default().compose(&[first, second], None).unwrap();
    result
        .field("status")
        .and_then(|f| f.validation.enum_values())
        .unwrap_or_default()
        .iter()
        .map(|v| v.to_string())
        .collect()
}

proptest! {
    #[test]
    fn enum_union_is_order_independent(
        a in proptest::collection::btree_set(any::<u8>(), 1..8),
        b in proptest::collection::btree_set(any::<u8>(), 1..8),
    ) {
        let forward = composed_enum(enum_field("A", &a), enum_field("B", &b));
        let backward = composed_enum(enum_field("B", &b), enum_field("A", &a));
        let expected: BTreeSet<String> = a.union(&b).map(|v| v.to_string()).collect();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward, expected);
    }
}

#[test]
fn test_bounds_take_the_stricter_value() {
    let a = single_field(
        "A",
        "score",
        FieldDefinition::new(FieldType::Number).with_rule(ValidationRule::range(Some(0.0), Some(100.0))),
    );
    let b = single_field(
        "B",
        "score",
        FieldDefinition::new(FieldType::Number).with_rule(ValidationRule::range(Some(10.0), None)),
    );
    let result = TraitCompositor::default().compose(&[a, b], None).unwrap();
    assert_eq!(
        result.field("score").unwrap().validation.range_bounds(),
        Some((Some(10.0), Some(100.0)))
    );
    assert!(result.metadata.warnings.is_empty());
}

#[test]
fn test_prefer_stricter_empty_intersection_keeps_incoming_and_warns() {
    let a = single_field("A", "tier", FieldDefinition::new(FieldType::String).with_rule(ValidationRule::one_of(["gold"])));
    let b = single_field("B", "tier", FieldDefinition::new(FieldType::String).with_rule(ValidationRule::one_of(["free"])));
    let options = CompositorOptions::default()
        .with_resolution("tier", CollisionResolutionPolicy::PreferStricter);

    let result = TraitCompositor::new(options).compose(&[a, b], None).unwrap();
    assert_eq!(
        result.field("tier").unwrap().validation.enum_values().unwrap(),
        &[json!("free")]
    );
    assert_eq!(result.metadata.warnings.len(), 1);
    assert_eq!(
        result.collision_for("tier").unwrap().resolution,
        ResolutionPath::PreferStricter
    );
}

#[test]
fn test_crossed_length_bounds_warn_and_fail_strict_mode() {
    let a = single_field(
        "Verbose",
        "code",
        FieldDefinition::new(FieldType::String).with_rule(ValidationRule::length(Some(10), None)),
    );
    let b = single_field(
        "Terse",
        "code",
        FieldDefinition::new(FieldType::String).with_rule(ValidationRule::length(None, Some(5))),
    );

    let result = TraitCompositor::default().compose(&[a.clone(), b.clone()], None).unwrap();
    assert_eq!(
        result.field("code").unwrap().validation.length_bounds(),
        Some((Some(10), Some(5)))
    );
    assert_eq!(result.metadata.warnings.len(), 1);
    assert_eq!(
        result.metadata.warnings[0].message,
        "length bounds exclude every value: min 10 > max 5"
    );

    let failure = TraitCompositor::new(CompositorOptions::default().with_strict_mode(true))
        .compose(&[a, b], None)
        .unwrap_err();
    assert_eq!(
        failure.errors,
        vec![CompositionError::StrictModeWarnings { warning_count: 1 }]
    );
}

#[test]
fn test_strict_mode_toggles_outcome() {
    let a = single_field("A", "email", FieldDefinition::new(FieldType::String));
    let b = single_field("B", "email", FieldDefinition::new(FieldType::String).required());

    let lenient = TraitCompositor::default().compose(&[a.clone(), b.clone()], None);
    assert!(lenient.is_ok());

    let strict = TraitCompositor::new(CompositorOptions::default().with_strict_mode(true))
        .compose(&[a, b], None)
        .unwrap_err();
    assert!(strict.has_kind(ErrorKind::StrictModeWarnings));
    assert_eq!(strict.warnings.len(), 1);
}

#[test]
fn test_strict_mode_passes_clean_compositions() {
    let a = single_field("A", "x", FieldDefinition::new(FieldType::String));
    let b = single_field("B", "y", FieldDefinition::new(FieldType::String));
    let strict = TraitCompositor::new(CompositorOptions::default().with_strict_mode(true));
    assert!(strict.compose(&[a, b], None).is_ok());
}

#[test]
fn test_base_object_fields_lose_to_traits_but_stay_in_history() {
    let override_number = single_field(
        "Numbered",
        "number",
        FieldDefinition::new(FieldType::String).with_rule(ValidationRule::pattern("^INV-[0-9]+$")),
    );
    let result = TraitCompositor::default()
        .compose(&[override_number], Some(&invoice_base()))
        .unwrap();

    let provenance = result.provenance_of("number").unwrap();
    assert_eq!(provenance.source, "Numbered");
    assert_eq!(provenance.layer, 1);
    assert_eq!(provenance.previous_sources, vec!["Invoice"]);
    assert_eq!(result.metadata.trait_order, vec!["Numbered"]);
    assert!(result.field("number").unwrap().required);
}

#[test]
fn test_options_from_json_drive_resolution() {
    let options = CompositorOptions::from_json(
        r#"{ "collisionResolutions": { "code": { "strategy": "prefer_trait", "trait": "First" } } }"#,
    )
    .unwrap();
    let first = single_field("First", "code", FieldDefinition::new(FieldType::String));
    let second = single_field("Second", "code", FieldDefinition::new(FieldType::String).required());

    let result = TraitCompositor::new(options).compose(&[first, second], None).unwrap();
    assert!(!result.field("code").unwrap().required);
    let record = result.collision_for("code").unwrap();
    assert_eq!(record.winner, "First");
    assert_eq!(record.sources, vec!["First", "Second"]);
    assert_eq!(result.provenance_of("code").unwrap().previous_sources, vec!["Second"]);
}

#[test]
fn test_result_serializes_with_camel_case_metadata() {
    let a = single_field("A", "x", FieldDefinition::new(FieldType::String));
    let result = TraitCompositor::default().compose(&[a], None).unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["metadata"]["traitOrder"], json!(["A"]));
    assert_eq!(value["metadata"]["provenance"]["x"]["previousSources"], json!([]));
    assert_eq!(value["schema"]["x"]["type"], json!("string"));

    let back: CompositionResult = serde_json::from_value(value).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_result_schema_is_generated() {
    let schema = schemars::schema_for!(CompositionResult);
    let rendered = serde_json::to_string(&schema).unwrap();
    assert!(rendered.contains("traitOrder"));
}

#[test]
fn test_each_run_gets_its_own_identity() {
    let a = single_field("A", "x", FieldDefinition::new(FieldType::String));
    let compositor = TraitCompositor::default();
    let first = compositor.compose(std::slice::from_ref(&a), None).unwrap();
    let second = compositor.compose(&[a], None).unwrap();
    assert_ne!(first.metadata.composition_id, second.metadata.composition_id);
    assert_eq!(first.schema, second.schema);
}
