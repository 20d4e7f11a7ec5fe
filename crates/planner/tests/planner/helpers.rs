use model::{DeclaredAttribute, EntityType, PropertyType, Schema, ValueType};
use planner::{Filter, FilterPayload};
use serde_json::Value as Json;
use std::sync::Arc;

/// Companies employ people through relationships; people expose the
/// relationship's function and company as declared properties.
pub fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new()
            .with(
                EntityType::new("Company", "companies")
                    .field("name", ValueType::String)
                    .field("size", ValueType::Integer)
                    .field("founded_on", ValueType::Date)
                    .has_many("relationships", "Relationship", "company_id")
                    .has_many_through("people", "Person", "relationships", "person"),
            )
            .with(
                EntityType::new("Relationship", "relationships")
                    .field("function", ValueType::String)
                    .belongs_to("company", "Company", "company_id")
                    .belongs_to("person", "Person", "person_id"),
            )
            .with(
                EntityType::new("Person", "people")
                    .field("first_name", ValueType::String)
                    .field("last_name", ValueType::String)
                    .field("birthday", ValueType::Date)
                    .has_many("relationships", "Relationship", "person_id")
                    .has_many_through("companies", "Company", "relationships", "company")
                    .property(
                        "function",
                        PropertyType::Scalar(ValueType::String),
                        DeclaredAttribute::JoinedColumn {
                            associations: vec!["relationships".to_string()],
                            column: "function".to_string(),
                        },
                    )
                    .property(
                        "company_fk",
                        PropertyType::Entity("Company".to_string()),
                        DeclaredAttribute::JoinedColumn {
                            associations: vec!["relationships".to_string()],
                            column: "company_id".to_string(),
                        },
                    ),
            ),
    )
}

pub fn filter(model: &str, predicates: Json, order: Json) -> Filter {
    let payload = FilterPayload::new(some(predicates), some(order));
    Filter::new(schema(), model, payload).expect("filter should build")
}

fn some(node: Json) -> Option<Json> {
    if node.is_null() { None } else { Some(node) }
}
