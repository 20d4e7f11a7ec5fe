use model::cast::CastError;
use thiserror::Error;

/// All errors the filter compiler can raise. Every variant points at a
/// defect in the filter payload or the entity metadata; nothing is retried
/// or auto-corrected, and no partial plan is returned on failure.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    #[error("unknown property `{property}` on `{model}`")]
    UnknownProperty { model: String, property: String },

    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),

    #[error("predicate `{kind}` does not support properties of type `{property_type}`")]
    UnsupportedPropertyType { kind: String, property_type: String },

    #[error("predicate `{kind}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        kind: String,
        expected: usize,
        got: usize,
    },

    #[error("ambiguous join on `{0}`: same table alias joined with different conditions")]
    AmbiguousJoin(String),

    #[error("cannot intersect filters on `{left}` and `{right}`")]
    IncompatibleModel { left: String, right: String },

    #[error("cannot join polymorphic belongs_to association `{0}`")]
    PolymorphicAssociation(String),

    #[error("malformed filter payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Cast(#[from] CastError),
}
