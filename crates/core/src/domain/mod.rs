// Domain Layer - Entity contract, filters and read options

pub mod criteria;
pub mod entity;
pub mod query;
pub mod unique_key;

// Re-exports
pub use criteria::Criteria;
pub use entity::{Entity, EntityId, Field, FieldKind, Record, ID_FIELD};
pub use query::{
    Direction, FindOptions, OrderBy, PartialResponse, Populate, QueryOptions, DEFAULT_ORDER,
};
pub use unique_key::UniqueKey;
