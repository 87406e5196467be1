//! Formlets - recursive form composition and data population
//!
//! A form is a tree of nodes. Each node is prepared by a [`Formlet`], owns
//! fields and named groups of child nodes, and resolves every field's value
//! from a prior submission, an explicit value, bound data or a default, in that
//! order. Relations on bound records replicate child nodes to mirror one-to-many
//! and many-to-many associations.

pub mod app;
pub mod config;
pub mod data;
pub mod form;
pub mod schema;
pub mod ui;

pub use config::FormletsConfig;
pub use data::{BoundData, MemoryRecord, MemoryRelation, MemorySession, PriorInput};
pub use form::{
    formlet, BuildOutput, Field, FieldKind, Form, FormError, Formlet, Method, Prepare, Result,
};
pub use schema::{FormFixture, SchemaRegistry};
