use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types a filterable property or a predicate argument can have.
///
/// `Period` only occurs as an argument type (a period-unit token such as
/// `"month"`); `Reference` is the argument type for entity-typed properties,
/// where the raw value is a primary key passed through uncast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    List,
    Period,
    Reference,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::List => "list",
            ValueType::Period => "period",
            ValueType::Reference => "reference",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type of a property: a plain scalar column, or another entity when the
/// property is an association (filtered by primary key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Scalar(ValueType),
    Entity(String),
}

impl PropertyType {
    /// The value type used to look up predicate argument signatures.
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyType::Scalar(ty) => *ty,
            PropertyType::Entity(_) => ValueType::Reference,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyType::Scalar(ty) => ty.name(),
            PropertyType::Entity(name) => name,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
