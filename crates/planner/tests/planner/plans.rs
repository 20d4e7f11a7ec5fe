use crate::helpers::{filter, schema};
use planner::query::ast::common::{OrderDir, TableRef};
use planner::query::ast::expr::Expr;
use planner::query::ast::relation::Relation;
use planner::{Filter, FilterPayload};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_empty_filter_plans_to_the_bare_table() {
    let plan_owner = filter("Company", json!(null), json!(null));
    let plan = plan_owner.plan().unwrap();

    assert_eq!(plan.model, "Company");
    assert_eq!(plan.table, TableRef::new("companies"));
    assert_eq!(plan.relation, Relation::table("companies"));
    assert_eq!(plan.restriction, Expr::truth());
    assert!(plan.order_by.is_empty());
}

#[test]
fn test_empty_combinator_is_equivalent_to_no_predicates() {
    let absent = filter("Company", json!(null), json!(null));
    let and = filter("Company", json!(["and"]), json!(null));
    let or = filter("Company", json!(["or"]), json!(null));

    for constrained in [and, or] {
        let plan = constrained.plan().unwrap();
        assert_eq!(plan.restriction, absent.plan().unwrap().restriction);
        assert_eq!(plan.relation, absent.plan().unwrap().relation);
    }
}

#[test]
fn test_direct_field_predicate_needs_no_joins() {
    let f = filter("Company", json!(["name", "eq", "Acme"]), json!(null));
    let plan = f.plan().unwrap();

    assert_eq!(plan.relation, Relation::table("companies"));
    assert!(plan.joined_tables().is_empty());
}

#[test]
fn test_paths_through_the_same_association_share_one_join() {
    let f = filter(
        "Company",
        json!([
            "and",
            ["relationships.person.last_name", "eq", "Smith"],
            ["relationships.function", "eq", "CEO"]
        ]),
        json!(null),
    );
    let plan = f.plan().unwrap();

    // One relationships join serves both paths; only the longer path also
    // joins people.
    assert_eq!(
        plan.joined_tables(),
        vec![
            &TableRef::aliased("relationships", "relationships_relationships"),
            &TableRef::aliased("people", "relationships_person_people"),
        ]
    );
}

#[test]
fn test_through_association_joins_both_hops() {
    let f = filter(
        "Company",
        json!(["people.last_name", "eq", "Smith"]),
        json!([["people.last_name", "<"]]),
    );
    let plan = f.plan().unwrap();

    assert_eq!(
        plan.joined_tables(),
        vec![
            &TableRef::aliased("relationships", "people_relationships"),
            &TableRef::aliased("people", "people_people"),
        ]
    );
    assert_eq!(plan.order_by.len(), 1);
    assert_eq!(
        plan.order_by[0].table,
        TableRef::aliased("people", "people_people")
    );
    assert_eq!(plan.order_by[0].column, "last_name");
    assert_eq!(plan.order_by[0].direction, OrderDir::Asc);
}

#[test]
fn test_distinct_path_prefixes_keep_distinct_joins() {
    // relationships.person.* and people.* reach the same tables under
    // different path prefixes, so they stay separate joins.
    let f = filter(
        "Company",
        json!([
            "and",
            ["relationships.person.last_name", "eq", "Smith"],
            ["people.first_name", "eq", "Ada"]
        ]),
        json!(null),
    );
    let plan = f.plan().unwrap();
    assert_eq!(plan.joined_tables().len(), 4);
}

#[test]
fn test_entity_typed_property_hops_over_the_foreign_key() {
    let f = filter(
        "Person",
        json!(["company_fk.name", "eq", "Acme"]),
        json!(null),
    );
    let plan = f.plan().unwrap();

    assert_eq!(
        plan.joined_tables(),
        vec![
            &TableRef::aliased("relationships", "company_fk_relationships"),
            &TableRef::aliased("companies", "company_fk_companies"),
        ]
    );
}

#[test]
fn test_declared_property_filters_through_its_associations() {
    let f = filter("Person", json!(["function", "eq", "CEO"]), json!(null));
    let plan = f.plan().unwrap();

    assert_eq!(
        plan.joined_tables(),
        vec![&TableRef::aliased("relationships", "function_relationships")]
    );
}

#[test]
fn test_association_as_property_filters_by_primary_key() {
    let f = filter("Relationship", json!(["company", "eq", 42]), json!(null));
    let plan = f.plan().unwrap();

    assert_eq!(
        plan.joined_tables(),
        vec![&TableRef::aliased("companies", "company_companies")]
    );
}

#[test]
fn test_ordering_directions() {
    let f = filter(
        "Company",
        json!(null),
        json!([["name", "<"], ["size", ">"]]),
    );
    let plan = f.plan().unwrap();

    assert_eq!(plan.order_by.len(), 2);
    assert_eq!(plan.order_by[0].direction, OrderDir::Asc);
    assert_eq!(plan.order_by[1].direction, OrderDir::Desc);
    assert_eq!(plan.order_by[1].table, TableRef::new("companies"));
}

#[test]
fn test_plan_is_cached_and_deterministic() {
    let f = filter(
        "Company",
        json!(["relationships.function", "eq", "CEO"]),
        json!([["name", "<"]]),
    );
    let first = f.plan().unwrap();
    let second = f.plan().unwrap();
    assert!(std::ptr::eq(first, second));

    let again = filter(
        "Company",
        json!(["relationships.function", "eq", "CEO"]),
        json!([["name", "<"]]),
    );
    let rebuilt = again.plan().unwrap();
    assert_eq!(first.relation, rebuilt.relation);
    assert_eq!(first.restriction, rebuilt.restriction);
    assert_eq!(first.order_by, rebuilt.order_by);
}

#[test]
fn test_intersection_plans_like_the_conjoined_payload() {
    let schema = schema();
    let left = Filter::new(
        Arc::clone(&schema),
        "Company",
        FilterPayload::new(
            Some(json!(["relationships.function", "eq", "CEO"])),
            Some(json!([["name", "<"]])),
        ),
    )
    .unwrap();
    let right = Filter::new(
        Arc::clone(&schema),
        "Company",
        FilterPayload::new(
            Some(json!(["relationships.person.last_name", "eq", "Smith"])),
            None,
        ),
    )
    .unwrap();

    let merged = left.intersect(&right).unwrap();
    let plan = merged.plan().unwrap();

    // The shared relationships join collapses across the two source filters.
    assert_eq!(
        plan.joined_tables(),
        vec![
            &TableRef::aliased("relationships", "relationships_relationships"),
            &TableRef::aliased("people", "relationships_person_people"),
        ]
    );
    assert_eq!(plan.order_by.len(), 1);
}

#[test]
fn test_payload_survives_a_serde_round_trip_into_the_same_plan() {
    let payload = FilterPayload::new(
        Some(json!(["relationships.function", "eq", "CEO"])),
        Some(json!([["name", ">"]])),
    );
    let encoded = serde_json::to_string(&payload).unwrap();
    let decoded: FilterPayload = serde_json::from_str(&encoded).unwrap();

    let schema = schema();
    let original = Filter::new(Arc::clone(&schema), "Company", payload).unwrap();
    let revived = Filter::new(schema, "Company", decoded).unwrap();

    assert_eq!(original.payload(), revived.payload());
    assert_eq!(
        original.plan().unwrap().restriction,
        revived.plan().unwrap().restriction
    );
}
