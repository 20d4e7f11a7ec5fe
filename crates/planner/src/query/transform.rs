//! Pure transformation passes over join trees and expressions.

use crate::error::FilterError;
use crate::query::ast::common::TableRef;
use crate::query::ast::expr::{Attribute, BinaryOp, Expr};
use crate::query::ast::relation::{Join, Relation};
use std::collections::HashMap;

/// Structurally substitute `target` with `replacement` wherever it appears
/// in `rel`. Used to graft a property's join requirement onto the combined
/// tree by swapping out its base table.
pub fn replace(rel: &Relation, target: &Relation, replacement: &Relation) -> Relation {
    if rel == target {
        return replacement.clone();
    }
    match rel {
        Relation::Table(_) => rel.clone(),
        Relation::Join(j) => Relation::Join(Box::new(Join {
            left: replace(&j.left, target, replacement),
            right: replace(&j.right, target, replacement),
            kind: j.kind,
            on: j.on.clone(),
        })),
    }
}

/// Alias every joined table in `rel` that is not yet aliased as
/// `{prefix}_{table}`, rewriting join conditions against the renames.
///
/// The base table at the bottom of the left spine is never renamed. Every
/// visited joined table (renamed or already aliased) is recorded in
/// `renames` so condition rewriting and attribute rebinding can find the
/// current reference for a table name.
pub fn prefix(rel: &Relation, scope: &str, renames: &mut Vec<TableRef>) -> Relation {
    match rel {
        Relation::Table(_) => rel.clone(),
        Relation::Join(j) => {
            let left = match &j.left {
                Relation::Join(_) => prefix(&j.left, scope, renames),
                base => base.clone(),
            };
            let right = match &j.right {
                Relation::Table(t) => Relation::Table(prefix_table(t, scope, renames)),
                nested => prefix(nested, scope, renames),
            };
            let on = prefix_expr(&j.on, renames);
            Relation::Join(Box::new(Join {
                left,
                right,
                kind: j.kind,
                on,
            }))
        }
    }
}

fn prefix_table(t: &TableRef, scope: &str, renames: &mut Vec<TableRef>) -> TableRef {
    let out = if t.alias.is_some() {
        t.clone()
    } else {
        TableRef::aliased(&t.table, &format!("{scope}_{}", t.table))
    };
    renames.push(out.clone());
    out
}

/// Rebind an unaliased table reference to the most recent rename recorded
/// for its table name. Aliased references are already scoped and stay put.
pub fn rebind_table(t: &TableRef, renames: &[TableRef]) -> TableRef {
    if t.alias.is_some() {
        return t.clone();
    }
    renames
        .iter()
        .rev()
        .find(|r| r.table == t.table)
        .cloned()
        .unwrap_or_else(|| t.clone())
}

fn prefix_expr(expr: &Expr, renames: &[TableRef]) -> Expr {
    match expr {
        Expr::Attribute(attr) => {
            let table = rebind_table(&attr.table, renames);
            Expr::attribute(Attribute::column_ref(table, &attr.column))
        }
        Expr::BinaryOp(op) => Expr::BinaryOp(Box::new(BinaryOp {
            left: prefix_expr(&op.left, renames),
            op: op.op,
            right: prefix_expr(&op.right, renames),
        })),
        Expr::Value(_) | Expr::List(_) => expr.clone(),
    }
}

/// Rewrite the join tree so each table identity is joined at most once.
///
/// Walks the left (driving) spine depth-first, tracking join conditions per
/// right-hand table identity in two maps: conditions already committed by a
/// deeper node, and conditions still pending further up. A join whose table
/// already carries an equal committed condition collapses away; a different
/// condition on the same identity is an irreconcilable duplicate.
pub fn uniq_joins(rel: &Relation) -> Result<Relation, FilterError> {
    let mut committed = HashMap::new();
    uniq(rel, &mut committed, &HashMap::new())
}

fn uniq(
    rel: &Relation,
    committed: &mut HashMap<TableRef, Expr>,
    pending: &HashMap<TableRef, Expr>,
) -> Result<Relation, FilterError> {
    let Relation::Join(j) = rel else {
        return Ok(rel.clone());
    };
    let right_table = match &j.right {
        Relation::Table(t) => Some(t.clone()),
        _ => None,
    };

    let mut pending_below = pending.clone();
    if let Some(key) = &right_table {
        pending_below.insert(key.clone(), j.on.clone());
    }
    let left = uniq(&j.left, committed, &pending_below)?;

    if let Some(key) = &right_table {
        if let Some(condition) = committed.get(key) {
            return if *condition == j.on {
                Ok(left)
            } else {
                Err(FilterError::AmbiguousJoin(key.identity().to_string()))
            };
        }
        if let Some(condition) = pending.get(key) {
            committed.insert(key.clone(), j.on.clone());
            if *condition != j.on {
                // A node above joins the same identity differently; it will
                // surface the conflict when it sees the committed condition.
                return Ok(left);
            }
            return Ok(Relation::Join(Box::new(Join {
                left,
                right: j.right.clone(),
                kind: j.kind,
                on: j.on.clone(),
            })));
        }
    }

    Ok(Relation::Join(Box::new(Join {
        left,
        right: j.right.clone(),
        kind: j.kind,
        on: j.on.clone(),
    })))
}

/// All attribute references used in an expression, in traversal order.
/// Binary nodes (comparisons and and/or compounds) contribute their
/// operands; literal values contribute nothing.
pub fn collect_attributes<'a>(expr: &'a Expr, out: &mut Vec<&'a Attribute>) {
    match expr {
        Expr::Attribute(attr) => out.push(attr),
        Expr::BinaryOp(op) => {
            collect_attributes(&op.left, out);
            collect_attributes(&op.right, out);
        }
        Expr::Value(_) | Expr::List(_) => {}
    }
}
