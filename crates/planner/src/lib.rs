pub mod error;
pub mod filter;
pub mod kinds;
pub mod ordering;
pub mod plan;
pub mod predicate;
pub mod property;
pub mod query;
pub mod registry;

pub use error::FilterError;
pub use filter::{Filter, FilterPayload};
pub use plan::{OrderTerm, Plan};
