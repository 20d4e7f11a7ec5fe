//! Predicate tree: parsing the boolean payload and lowering it to an
//! expression.

use crate::error::FilterError;
use crate::property::PropertyPath;
use crate::query::ast::expr::Expr;
use crate::registry::{self, PredicateKind};
use model::{EntityType, Schema, Value, ValueCaster};
use serde_json::Value as Json;
use std::sync::{Arc, OnceLock};

/// A single predicate application: a kind bound to a property path with its
/// raw arguments. Arguments are cast lazily and cached on success, so a cast
/// failure propagates every time instead of being pinned.
#[derive(Debug)]
pub struct Predicate {
    pub kind: Arc<PredicateKind>,
    pub path: PropertyPath,
    raw_args: Vec<Json>,
    args: OnceLock<Vec<Value>>,
}

impl Predicate {
    pub fn new(kind: Arc<PredicateKind>, path: PropertyPath, raw_args: Vec<Json>) -> Self {
        Predicate {
            kind,
            path,
            raw_args,
            args: OnceLock::new(),
        }
    }

    /// Cast the raw arguments against the kind's signature for this path's
    /// value type.
    pub fn arguments(&self, caster: &dyn ValueCaster) -> Result<Vec<Value>, FilterError> {
        if let Some(args) = self.args.get() {
            return Ok(args.clone());
        }
        let value_type = self.path.ty().value_type();
        let signature = registry::signature_for(&self.kind, value_type).ok_or_else(|| {
            FilterError::UnsupportedPropertyType {
                kind: self.kind.name.clone(),
                property_type: self.path.ty().name().to_string(),
            }
        })?;
        if signature.len() != self.raw_args.len() {
            return Err(FilterError::ArityMismatch {
                kind: self.kind.name.clone(),
                expected: signature.len(),
                got: self.raw_args.len(),
            });
        }
        let mut args = Vec::with_capacity(signature.len());
        for (ty, raw) in signature.iter().zip(&self.raw_args) {
            args.push(caster.cast(*ty, raw)?);
        }
        let _ = self.args.set(args.clone());
        Ok(args)
    }

    fn to_expression(&self, schema: &Schema, caster: &dyn ValueCaster) -> Result<Expr, FilterError> {
        let attr = self.path.attribute(schema)?;
        let args = self.arguments(caster)?;
        Ok(self.kind.op.lower(attr, self.path.ty(), &args))
    }
}

/// The parsed boolean structure of a filter payload.
#[derive(Debug)]
pub enum PredicateTree {
    /// The empty filter; lowers to an always-true expression.
    True,
    Leaf(Predicate),
    And(Vec<PredicateTree>),
    Or(Vec<PredicateTree>),
}

impl PredicateTree {
    /// Parse a payload node rooted at `entity`.
    ///
    /// Grammar: `null` and `[]` mean no constraint; `["and", node...]` and
    /// `["or", node...]` combine; anything else of the shape
    /// `[path, kind, arg...]` is a leaf, with `path` either a dotted string
    /// or an array of segments.
    pub fn build(schema: &Schema, entity: &EntityType, node: &Json) -> Result<Self, FilterError> {
        match node {
            Json::Null => Ok(PredicateTree::True),
            Json::Array(items) if items.is_empty() => Ok(PredicateTree::True),
            Json::Array(items) => {
                if let Some(combinator) = items[0].as_str() {
                    match combinator {
                        "and" => {
                            return Self::build_children(schema, entity, &items[1..])
                                .map(PredicateTree::And);
                        }
                        "or" => {
                            return Self::build_children(schema, entity, &items[1..])
                                .map(PredicateTree::Or);
                        }
                        _ => {}
                    }
                }
                Self::build_leaf(schema, entity, items)
            }
            other => Err(FilterError::MalformedPayload(format!(
                "expected a predicate node, got {other}"
            ))),
        }
    }

    fn build_children(
        schema: &Schema,
        entity: &EntityType,
        nodes: &[Json],
    ) -> Result<Vec<Self>, FilterError> {
        nodes
            .iter()
            .map(|node| Self::build(schema, entity, node))
            .collect()
    }

    fn build_leaf(schema: &Schema, entity: &EntityType, items: &[Json]) -> Result<Self, FilterError> {
        if items.len() < 2 {
            return Err(FilterError::MalformedPayload(format!(
                "predicate leaf needs a path and a kind, got {} element(s)",
                items.len()
            )));
        }
        let segments = path_segments(&items[0])?;
        let kind_name = items[1].as_str().ok_or_else(|| {
            FilterError::MalformedPayload(format!("predicate kind must be a string, got {}", items[1]))
        })?;
        let kind = registry::kind_named(kind_name)
            .ok_or_else(|| FilterError::UnknownPredicate(kind_name.to_string()))?;
        let path = PropertyPath::new(schema, entity, &segments)?;
        Ok(PredicateTree::Leaf(Predicate::new(
            kind,
            path,
            items[2..].to_vec(),
        )))
    }

    /// Lower the tree to a boolean expression. Empty combinators and the
    /// empty tree lower to the shared always-true expression; single-child
    /// combinators are unwrapped.
    pub fn to_expression(
        &self,
        schema: &Schema,
        caster: &dyn ValueCaster,
    ) -> Result<Expr, FilterError> {
        match self {
            PredicateTree::True => Ok(Expr::truth()),
            PredicateTree::Leaf(predicate) => predicate.to_expression(schema, caster),
            PredicateTree::And(children) => Self::fold(children, Expr::and, schema, caster),
            PredicateTree::Or(children) => Self::fold(children, Expr::or, schema, caster),
        }
    }

    fn fold(
        children: &[PredicateTree],
        combine: fn(Expr, Expr) -> Expr,
        schema: &Schema,
        caster: &dyn ValueCaster,
    ) -> Result<Expr, FilterError> {
        let mut exprs = children
            .iter()
            .map(|child| child.to_expression(schema, caster))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let Some(first) = exprs.next() else {
            return Ok(Expr::truth());
        };
        Ok(exprs.fold(first, combine))
    }
}

pub(crate) fn path_segments(node: &Json) -> Result<Vec<String>, FilterError> {
    match node {
        Json::String(path) => Ok(path.split('.').map(str::to_string).collect()),
        Json::Array(parts) => parts
            .iter()
            .map(|part| {
                part.as_str().map(str::to_string).ok_or_else(|| {
                    FilterError::MalformedPayload(format!(
                        "property path segment must be a string, got {part}"
                    ))
                })
            })
            .collect(),
        other => Err(FilterError::MalformedPayload(format!(
            "property path must be a string or an array of strings, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{JsonCaster, ValueType};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with(
                EntityType::new("Company", "companies")
                    .field("name", ValueType::String)
                    .field("size", ValueType::Integer)
                    .has_many("relationships", "Relationship", "company_id"),
            )
            .with(
                EntityType::new("Relationship", "relationships")
                    .field("function", ValueType::String)
                    .belongs_to("company", "Company", "company_id"),
            )
    }

    fn build(node: serde_json::Value) -> Result<PredicateTree, FilterError> {
        let schema = schema();
        let company = schema.entity("Company").unwrap();
        PredicateTree::build(&schema, company, &node)
    }

    #[test]
    fn test_null_and_empty_array_mean_no_constraint() {
        assert!(matches!(build(json!(null)).unwrap(), PredicateTree::True));
        assert!(matches!(build(json!([])).unwrap(), PredicateTree::True));
    }

    #[test]
    fn test_leaf_accepts_dotted_and_segmented_paths() {
        let dotted = build(json!(["relationships.function", "eq", "CEO"])).unwrap();
        let segmented = build(json!([["relationships", "function"], "eq", "CEO"])).unwrap();
        for tree in [dotted, segmented] {
            let PredicateTree::Leaf(predicate) = tree else {
                panic!("expected leaf");
            };
            assert_eq!(predicate.kind.name, "eq");
            assert_eq!(predicate.path.name, "relationships_function");
        }
    }

    #[test]
    fn test_combinators_nest() {
        let tree = build(json!([
            "or",
            ["name", "eq", "Acme"],
            ["and", ["size", "greater_than", 10], ["size", "less_than", 100]]
        ]))
        .unwrap();
        let PredicateTree::Or(children) = tree else {
            panic!("expected or");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[1], PredicateTree::And(ref inner) if inner.len() == 2));
    }

    #[test]
    fn test_kind_name_is_normalized() {
        let tree = build(json!(["name", "BeginsWith", "Ac"])).unwrap();
        let PredicateTree::Leaf(predicate) = tree else {
            panic!("expected leaf");
        };
        assert_eq!(predicate.kind.name, "begins_with");
    }

    #[test]
    fn test_unknown_predicate_kind() {
        let err = build(json!(["name", "sounds_like", "Acme"])).unwrap_err();
        assert!(matches!(err, FilterError::UnknownPredicate(kind) if kind == "sounds_like"));
    }

    #[test]
    fn test_malformed_nodes() {
        assert!(matches!(
            build(json!(42)).unwrap_err(),
            FilterError::MalformedPayload(_)
        ));
        assert!(matches!(
            build(json!(["name"])).unwrap_err(),
            FilterError::MalformedPayload(_)
        ));
        assert!(matches!(
            build(json!([["name", 7], "eq", "x"])).unwrap_err(),
            FilterError::MalformedPayload(_)
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let tree = build(json!(["size", "between", 1])).unwrap();
        let PredicateTree::Leaf(predicate) = tree else {
            panic!("expected leaf");
        };
        let err = predicate.arguments(&JsonCaster).unwrap_err();
        assert!(matches!(
            err,
            FilterError::ArityMismatch { kind, expected: 2, got: 1 } if kind == "between"
        ));
    }

    #[test]
    fn test_unsupported_property_type() {
        let tree = build(json!(["size", "begins_with", "1"])).unwrap();
        let PredicateTree::Leaf(predicate) = tree else {
            panic!("expected leaf");
        };
        let err = predicate.arguments(&JsonCaster).unwrap_err();
        assert!(matches!(
            err,
            FilterError::UnsupportedPropertyType { kind, property_type }
                if kind == "begins_with" && property_type == "integer"
        ));
    }

    #[test]
    fn test_empty_combinator_lowers_to_truth() {
        let schema = schema();
        let company = schema.entity("Company").unwrap();
        let tree = PredicateTree::build(&schema, company, &json!(["and"])).unwrap();
        let expr = tree.to_expression(&schema, &JsonCaster).unwrap();
        assert_eq!(expr, Expr::truth());
    }

    #[test]
    fn test_leaf_lowers_to_comparison() {
        let schema = schema();
        let company = schema.entity("Company").unwrap();
        let tree =
            PredicateTree::build(&schema, company, &json!(["name", "eq", "Acme"])).unwrap();
        let expr = tree.to_expression(&schema, &JsonCaster).unwrap();
        let expected = Expr::eq(
            Expr::attribute(crate::query::ast::expr::Attribute::column_ref(
                crate::query::ast::common::TableRef::new("companies"),
                "name",
            )),
            Expr::Value(Value::String("Acme".to_string())),
        );
        assert_eq!(expr, expected);
    }
}
