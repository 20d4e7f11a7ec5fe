use serde::Serialize;
use std::fmt;

/// A table reference. Identity within one plan is table name plus alias;
/// the same table joined under two aliases is two distinct join targets.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        TableRef {
            table: table.to_string(),
            alias: None,
        }
    }

    pub fn aliased(table: &str, alias: &str) -> Self {
        TableRef {
            table: table.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// The name the table is addressed by in conditions and order terms.
    pub fn identity(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum JoinKind {
    LeftOuter,
    Inner,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
