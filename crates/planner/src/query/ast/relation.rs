use crate::query::ast::common::{JoinKind, TableRef};
use crate::query::ast::expr::Expr;
use serde::Serialize;

/// A join operation. `left` is the driving side; `right` is the joined
/// relation, normally a plain table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Join {
    pub left: Relation,
    pub right: Relation,
    pub kind: JoinKind,
    pub on: Expr,
}

/// An immutable join tree: either a base table or a join whose left side is
/// another relation. Transformation passes return new trees rather than
/// mutating shared nodes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Relation {
    Table(TableRef),
    Join(Box<Join>),
}

impl Relation {
    pub fn table(name: &str) -> Self {
        Relation::Table(TableRef::new(name))
    }

    pub fn join(self, right: Relation, kind: JoinKind, on: Expr) -> Self {
        Relation::Join(Box::new(Join {
            left: self,
            right,
            kind,
            on,
        }))
    }

    pub fn outer_join(self, right: TableRef, on: Expr) -> Self {
        self.join(Relation::Table(right), JoinKind::LeftOuter, on)
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Relation::Join(_))
    }
}
