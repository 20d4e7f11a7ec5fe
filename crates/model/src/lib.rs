pub mod cast;
pub mod core;
pub mod schema;

pub use cast::{CastError, JsonCaster, ValueCaster};
pub use core::data_type::{PropertyType, ValueType};
pub use core::value::Value;
pub use schema::{
    Association, AssociationKind, DeclaredAttribute, DeclaredProperty, EntityType, Field, Schema,
};
