use crate::property::PropertyPath;
use crate::query::ast::common::OrderDir;

/// One ordering term: a property path and a direction.
#[derive(Debug)]
pub struct Ordering {
    pub path: PropertyPath,
    pub direction: OrderDir,
}

impl Ordering {
    pub fn new(path: PropertyPath, direction: OrderDir) -> Self {
        Ordering { path, direction }
    }
}

/// Direction tokens as they appear in payloads: `">"` is descending,
/// anything else ascending.
pub fn direction_from_token(token: &str) -> OrderDir {
    match token {
        ">" => OrderDir::Desc,
        _ => OrderDir::Asc,
    }
}
