//! Collaborator contracts consumed by the form engine
//!
//! The engine never queries storage itself. Bound records, their relationships
//! and the session are reached only through the traits below.

use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bound::BoundData;

/// Shared handle to a bound record
pub type RecordRef = Rc<dyn Record>;

/// An entity that can be bound to a form node
pub trait Record: fmt::Debug {
    /// Named property access; `None` when the property does not exist
    fn get(&self, name: &str) -> Option<BoundData>;

    /// Look up a relationship accessor by name
    fn relation(&self, name: &str) -> RelationAccessor;

    /// Whether the record is persisted (edit flow) or new (create flow)
    fn exists(&self) -> bool;

    /// Primary key, used for association membership and as the record's scalar value
    fn key(&self) -> Option<Value>;
}

/// Outcome of asking a record for a relationship accessor
#[derive(Debug, Clone)]
pub enum RelationAccessor {
    /// No accessor of that name
    Missing,
    /// The name exists but is a plain property
    NotARelation,
    Relation(Rc<dyn Relationship>),
}

/// Cardinality of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        }
    }
}

/// Opaque handle to a relationship of a bound record
pub trait Relationship: fmt::Debug {
    fn kind(&self) -> RelationKind;

    /// Whether the record owning this relationship is persisted
    fn owner_exists(&self) -> bool;

    /// Related record(s); for many-to-many, the currently associated subset
    fn fetch_related(&self, query: &RelationQuery) -> Result<Vec<RecordRef>>;

    /// Every record that could be associated (many-to-many options)
    fn fetch_candidates(&self, query: &RelationQuery) -> Result<Vec<RecordRef>>;

    /// Whether `candidate` is part of the current association
    fn is_associated(&self, candidate: &dyn Record) -> bool;
}

/// Query customization handed to a relationship collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

/// Equality filter on a record property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl RelationQuery {
    pub fn where_eq(&mut self, field: &str, value: Value) -> &mut Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn order_by(&mut self, field: &str) -> &mut Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending: false,
        });
        self
    }

    pub fn order_by_desc(&mut self, field: &str) -> &mut Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }
}

/// Session collaborator issuing anti-forgery tokens
#[cfg_attr(test, mockall::automock)]
pub trait TokenSource {
    /// The token valid for the current session
    fn current_token(&self) -> String;
}
