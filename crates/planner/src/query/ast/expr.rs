use crate::query::ast::common::TableRef;
use crate::query::ast::relation::Relation;
use model::Value;
use serde::Serialize;

/// A column bound to a node of a join requirement.
///
/// `relation` is the join tree needed to reach the column (a bare
/// [`Relation::Table`] for direct fields); `table` names the node within it
/// the column belongs to. The plan assembler reads `relation` to build the
/// combined join graph and `table`/`column` to address the value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Attribute {
    pub relation: Relation,
    pub table: TableRef,
    pub column: String,
}

impl Attribute {
    /// An attribute on its own table, with no join requirement.
    pub fn column_ref(table: TableRef, column: &str) -> Self {
        Attribute {
            relation: Relation::Table(table.clone()),
            table,
            column: column.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    In,
    And,
    Or,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

/// A boolean/value expression over attributes and literals.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Expr {
    Attribute(Box<Attribute>),
    Value(Value),
    List(Vec<Value>),
    BinaryOp(Box<BinaryOp>),
}

impl Expr {
    pub fn attribute(attr: Attribute) -> Self {
        Expr::Attribute(Box::new(attr))
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::binary(left, BinaryOperator::Eq, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::binary(left, BinaryOperator::And, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::binary(left, BinaryOperator::Or, right)
    }

    /// The shared always-true expression (`1 = 1`), used for empty filters.
    pub fn truth() -> Self {
        Expr::eq(Expr::Value(Value::Int(1)), Expr::Value(Value::Int(1)))
    }
}
