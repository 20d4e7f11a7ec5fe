use crate::helpers::schema;
use planner::{Filter, FilterError, FilterPayload};
use serde_json::json;
use std::sync::Arc;

fn build(model: &str, predicates: serde_json::Value) -> Result<Filter, FilterError> {
    Filter::new(
        schema(),
        model,
        FilterPayload::new(Some(predicates), None),
    )
}

#[test]
fn test_unknown_entity_is_rejected_up_front() {
    let err = Filter::new(schema(), "Widget", FilterPayload::default()).unwrap_err();
    assert!(matches!(err, FilterError::UnknownEntity(name) if name == "Widget"));
}

#[test]
fn test_unknown_property_names_the_entity_it_was_looked_up_on() {
    let err = build("Company", json!(["owner", "eq", "x"])).unwrap_err();
    assert!(matches!(
        err,
        FilterError::UnknownProperty { model, property }
            if model == "Company" && property == "owner"
    ));

    // Mid-path failures blame the entity the segment resolves against.
    let err = build("Company", json!(["relationships.salary", "eq", 1])).unwrap_err();
    assert!(matches!(
        err,
        FilterError::UnknownProperty { model, property }
            if model == "Relationship" && property == "salary"
    ));
}

#[test]
fn test_unknown_predicate_kind_keeps_the_payload_spelling() {
    let err = build("Company", json!(["name", "sounds_like", "Acme"])).unwrap_err();
    assert!(matches!(err, FilterError::UnknownPredicate(kind) if kind == "sounds_like"));
}

#[test]
fn test_invalid_argument_fails_at_plan_time_every_time() {
    let f = build("Company", json!(["founded_on", "after", "yesterday-ish"])).unwrap();
    for _ in 0..2 {
        let err = f.plan().unwrap_err();
        assert!(matches!(err, FilterError::Cast(_)));
    }
}

#[test]
fn test_unsupported_property_type_at_plan_time() {
    let f = build("Company", json!(["size", "begins_with", "4"])).unwrap();
    let err = f.plan().unwrap_err();
    assert!(matches!(
        err,
        FilterError::UnsupportedPropertyType { kind, property_type }
            if kind == "begins_with" && property_type == "integer"
    ));
}

#[test]
fn test_arity_mismatch_at_plan_time() {
    let f = build("Company", json!(["founded_on", "between", "2020-01-01"])).unwrap();
    let err = f.plan().unwrap_err();
    assert!(matches!(
        err,
        FilterError::ArityMismatch { expected: 2, got: 1, .. }
    ));
}

#[test]
fn test_polymorphic_belongs_to_cannot_be_traversed() {
    use model::{EntityType, Schema, ValueType};
    let schema = Arc::new(
        Schema::new()
            .with(
                EntityType::new("Comment", "comments")
                    .belongs_to_polymorphic("subject", "Post", "subject_id"),
            )
            .with(EntityType::new("Post", "posts").field("title", ValueType::String)),
    );
    let f = Filter::new(
        schema,
        "Comment",
        FilterPayload::new(Some(json!(["subject.title", "eq", "Hello"])), None),
    )
    .unwrap();
    let err = f.plan().unwrap_err();
    assert!(matches!(err, FilterError::PolymorphicAssociation(name) if name == "subject"));
}

#[test]
fn test_malformed_payload_shapes() {
    assert!(matches!(
        build("Company", json!("name eq Acme")).unwrap_err(),
        FilterError::MalformedPayload(_)
    ));
    assert!(matches!(
        build("Company", json!({"name": "Acme"})).unwrap_err(),
        FilterError::MalformedPayload(_)
    ));
    assert!(matches!(
        build("Company", json!([42, "eq", "Acme"])).unwrap_err(),
        FilterError::MalformedPayload(_)
    ));
}

#[test]
fn test_ordering_on_an_unknown_path() {
    let err = Filter::new(
        schema(),
        "Company",
        FilterPayload::new(None, Some(json!([["owner", "<"]]))),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FilterError::UnknownProperty { model, property }
            if model == "Company" && property == "owner"
    ));
}
