//! Plan assembly: folding every predicate's and ordering's join requirement
//! into one deduplicated join graph.

use crate::error::FilterError;
use crate::ordering::Ordering;
use crate::predicate::PredicateTree;
use crate::query::ast::common::{OrderDir, TableRef};
use crate::query::ast::expr::{Attribute, Expr};
use crate::query::ast::relation::Relation;
use crate::query::transform::{collect_attributes, replace, uniq_joins};
use model::{EntityType, Schema, ValueCaster};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderTerm {
    pub table: TableRef,
    pub column: String,
    pub direction: OrderDir,
}

/// The compiled query plan: the root table, the combined join graph, the
/// boolean restriction and the ordering terms. Purely descriptive; rendering
/// it to SQL or an ORM relation is up to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Root entity name.
    pub model: String,
    pub table: TableRef,
    pub relation: Relation,
    pub restriction: Expr,
    pub order_by: Vec<OrderTerm>,
}

impl Plan {
    pub(crate) fn build(
        schema: &Schema,
        caster: &dyn ValueCaster,
        model: &EntityType,
        predicates: &PredicateTree,
        orderings: &[Ordering],
    ) -> Result<Plan, FilterError> {
        let restriction = predicates.to_expression(schema, caster)?;
        let root = Relation::table(&model.table);

        let mut order_attrs = Vec::with_capacity(orderings.len());
        for ordering in orderings {
            order_attrs.push((ordering.path.attribute(schema)?, ordering.direction));
        }

        let mut restriction_attrs: Vec<&Attribute> = Vec::new();
        collect_attributes(&restriction, &mut restriction_attrs);

        // Join requirements in first-seen order, structurally deduplicated.
        // The bare root carries no joins and is skipped.
        let mut requirements: Vec<&Relation> = Vec::new();
        for attr in restriction_attrs
            .iter()
            .copied()
            .chain(order_attrs.iter().map(|(attr, _)| attr))
        {
            if attr.relation == root || requirements.contains(&&attr.relation) {
                continue;
            }
            requirements.push(&attr.relation);
        }

        // Each requirement starts from the root table, so grafting is a
        // substitution of that base with everything combined so far.
        let mut combined = root.clone();
        for requirement in requirements {
            combined = replace(requirement, &root, &combined);
        }
        let relation = uniq_joins(&combined)?;

        let order_by = order_attrs
            .into_iter()
            .map(|(attr, direction)| OrderTerm {
                table: attr.table,
                column: attr.column,
                direction,
            })
            .collect();

        Ok(Plan {
            model: model.name.clone(),
            table: TableRef::new(&model.table),
            relation,
            restriction,
            order_by,
        })
    }

    /// Tables joined by the plan, base first, root excluded.
    pub fn joined_tables(&self) -> Vec<&TableRef> {
        let mut out = Vec::new();
        let mut cursor = &self.relation;
        while let Relation::Join(join) = cursor {
            if let Relation::Table(table) = &join.right {
                out.push(table);
            }
            cursor = &join.left;
        }
        out.reverse();
        out
    }
}
