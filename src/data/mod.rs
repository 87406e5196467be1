//! Data collaborators: bound records, relationships, prior input and sessions

mod bound;
mod memory;
mod prior;
mod traits;
mod values;

pub use bound::BoundData;
pub use memory::{MemoryRecord, MemoryRelation, MemorySession};
pub use prior::PriorInput;
pub use traits::{
    Filter, OrderBy, Record, RecordRef, RelationAccessor, RelationKind, RelationQuery,
    Relationship, TokenSource,
};
pub use values::{loose_eq, loosely_contains, scalar_text};

#[cfg(test)]
pub use traits::MockTokenSource;
