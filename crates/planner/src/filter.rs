//! The filter facade: a serializable payload bound to an entity, compiled
//! into a [`Plan`] on demand.

use crate::error::FilterError;
use crate::ordering::{Ordering, direction_from_token};
use crate::plan::Plan;
use crate::predicate::{PredicateTree, path_segments};
use crate::property::PropertyPath;
use model::{EntityType, JsonCaster, Schema, ValueCaster};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The wire form of a filter: the predicate tree and the ordering list, both
/// optional. Round-trips through serde unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicates: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Json>,
}

impl FilterPayload {
    pub fn new(predicates: Option<Json>, order: Option<Json>) -> Self {
        FilterPayload { predicates, order }
    }
}

/// A validated filter over one entity. Construction parses and resolves the
/// payload eagerly, so a `Filter` that exists is structurally sound; only
/// argument casting and join assembly are deferred to [`Filter::plan`].
pub struct Filter {
    schema: Arc<Schema>,
    caster: Arc<dyn ValueCaster>,
    model: String,
    payload: FilterPayload,
    predicates: PredicateTree,
    orderings: Vec<Ordering>,
    plan: OnceLock<Plan>,
}

impl Filter {
    pub fn new(
        schema: Arc<Schema>,
        model: &str,
        payload: FilterPayload,
    ) -> Result<Self, FilterError> {
        Self::with_caster(schema, Arc::new(JsonCaster), model, payload)
    }

    pub fn with_caster(
        schema: Arc<Schema>,
        caster: Arc<dyn ValueCaster>,
        model: &str,
        payload: FilterPayload,
    ) -> Result<Self, FilterError> {
        let entity = schema
            .entity(model)
            .ok_or_else(|| FilterError::UnknownEntity(model.to_string()))?;
        let predicates = PredicateTree::build(
            &schema,
            entity,
            payload.predicates.as_ref().unwrap_or(&Json::Null),
        )?;
        let orderings = parse_orderings(
            &schema,
            entity,
            payload.order.as_ref().unwrap_or(&Json::Null),
        )?;
        Ok(Filter {
            model: entity.name.clone(),
            schema,
            caster,
            payload,
            predicates,
            orderings,
            plan: OnceLock::new(),
        })
    }

    /// Entity name the filter is rooted at.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The wire form this filter was built from.
    pub fn payload(&self) -> &FilterPayload {
        &self.payload
    }

    /// Compile the filter into a query plan. The plan is built once and
    /// cached; a failing build is not cached and propagates on every call.
    pub fn plan(&self) -> Result<&Plan, FilterError> {
        if let Some(plan) = self.plan.get() {
            return Ok(plan);
        }
        let entity = self
            .schema
            .entity(&self.model)
            .ok_or_else(|| FilterError::UnknownEntity(self.model.clone()))?;
        let plan = Plan::build(
            &self.schema,
            self.caster.as_ref(),
            entity,
            &self.predicates,
            &self.orderings,
        )?;
        tracing::debug!(
            model = %self.model,
            joins = plan.joined_tables().len(),
            order_terms = plan.order_by.len(),
            "compiled filter plan"
        );
        Ok(self.plan.get_or_init(|| plan))
    }

    /// Conjoin two filters over the same entity into a new filter whose
    /// predicates are `["and", left, right]` (empty operands are dropped)
    /// and whose ordering is this filter's.
    pub fn intersect(&self, other: &Filter) -> Result<Filter, FilterError> {
        if self.model != other.model {
            return Err(FilterError::IncompatibleModel {
                left: self.model.clone(),
                right: other.model.clone(),
            });
        }
        let mut operands: Vec<Json> = vec![Json::String("and".to_string())];
        for payload in [&self.payload, &other.payload] {
            match &payload.predicates {
                None | Some(Json::Null) => {}
                Some(Json::Array(items)) if items.is_empty() => {}
                Some(node) => operands.push(node.clone()),
            }
        }
        let predicates = if operands.len() > 1 {
            Some(Json::Array(operands))
        } else {
            None
        };
        Filter::with_caster(
            Arc::clone(&self.schema),
            Arc::clone(&self.caster),
            &self.model,
            FilterPayload::new(predicates, self.payload.order.clone()),
        )
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("model", &self.model)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

fn parse_orderings(
    schema: &Schema,
    entity: &EntityType,
    node: &Json,
) -> Result<Vec<Ordering>, FilterError> {
    let items = match node {
        Json::Null => return Ok(Vec::new()),
        Json::Array(items) => items,
        other => {
            return Err(FilterError::MalformedPayload(format!(
                "ordering must be an array of [path, direction] pairs, got {other}"
            )));
        }
    };
    items
        .iter()
        .map(|item| {
            let Json::Array(pair) = item else {
                return Err(FilterError::MalformedPayload(format!(
                    "ordering term must be a [path, direction] pair, got {item}"
                )));
            };
            let [path, direction] = pair.as_slice() else {
                return Err(FilterError::MalformedPayload(format!(
                    "ordering term must have exactly two elements, got {}",
                    pair.len()
                )));
            };
            let token = direction.as_str().ok_or_else(|| {
                FilterError::MalformedPayload(format!(
                    "ordering direction must be a string, got {direction}"
                ))
            })?;
            Ok(Ordering::new(
                PropertyPath::new(schema, entity, &path_segments(path)?)?,
                direction_from_token(token),
            ))
        })
        .collect()
}
