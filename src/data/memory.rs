//! In-memory collaborators
//!
//! Records, relationships and a session backed by plain data. They are what the
//! preview binary deserializes fixtures into, and what the tests bind forms to.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bound::BoundData;
use super::traits::{
    Record, RecordRef, RelationAccessor, RelationKind, RelationQuery, Relationship, TokenSource,
};
use super::values::{compare, loose_eq};

fn persisted() -> bool {
    true
}

fn default_key_name() -> String {
    "id".to_string()
}

/// A record held in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Whether the record is persisted
    #[serde(default = "persisted")]
    pub exists: bool,
    /// Attribute holding the primary key
    #[serde(default = "default_key_name")]
    pub key_name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relations: IndexMap<String, MemoryRelation>,
}

impl MemoryRecord {
    /// A persisted record with the given attributes
    ///
    /// Non-object values produce a record without attributes.
    pub fn new(attributes: Value) -> Self {
        let attributes = match attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            exists: true,
            key_name: default_key_name(),
            attributes,
            relations: IndexMap::new(),
        }
    }

    /// A record that has not been saved yet
    pub fn unsaved(attributes: Value) -> Self {
        Self {
            exists: false,
            ..Self::new(attributes)
        }
    }

    pub fn with_relation(mut self, name: &str, relation: MemoryRelation) -> Self {
        self.relations.insert(name.to_string(), relation);
        self
    }

    pub fn into_ref(self) -> RecordRef {
        Rc::new(self)
    }
}

impl Record for MemoryRecord {
    fn get(&self, name: &str) -> Option<BoundData> {
        if let Some(value) = self.attributes.get(name) {
            return Some(BoundData::Value(value.clone()));
        }
        // A one-to-one relation reads like a nested record
        let relation = self.relations.get(name)?;
        match relation.kind {
            RelationKind::OneToOne => relation
                .related
                .first()
                .map(|record| BoundData::Record(record.clone().into_ref())),
            RelationKind::OneToMany | RelationKind::ManyToMany => None,
        }
    }

    fn relation(&self, name: &str) -> RelationAccessor {
        match self.relations.get(name) {
            Some(relation) => {
                RelationAccessor::Relation(Rc::new(relation.clone().owned_by(self.exists)))
            }
            None if self.attributes.contains_key(name) => RelationAccessor::NotARelation,
            None => RelationAccessor::Missing,
        }
    }

    fn exists(&self) -> bool {
        self.exists
    }

    fn key(&self) -> Option<Value> {
        self.attributes.get(&self.key_name).cloned()
    }
}

/// A relationship held in memory
///
/// `related` holds the associated records (with any pivot attributes) and
/// `candidates` every option a many-to-many relation can choose from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRelation {
    pub kind: RelationKind,
    #[serde(default)]
    pub related: Vec<MemoryRecord>,
    #[serde(default)]
    pub candidates: Vec<MemoryRecord>,
    #[serde(skip, default = "persisted")]
    owner_exists: bool,
}

impl MemoryRelation {
    pub fn new(kind: RelationKind) -> Self {
        Self {
            kind,
            related: Vec::new(),
            candidates: Vec::new(),
            owner_exists: true,
        }
    }

    pub fn one_to_one(related: Option<MemoryRecord>) -> Self {
        Self {
            related: related.into_iter().collect(),
            ..Self::new(RelationKind::OneToOne)
        }
    }

    pub fn one_to_many(related: Vec<MemoryRecord>) -> Self {
        Self {
            related,
            ..Self::new(RelationKind::OneToMany)
        }
    }

    pub fn many_to_many(candidates: Vec<MemoryRecord>, associated: Vec<MemoryRecord>) -> Self {
        Self {
            related: associated,
            candidates,
            ..Self::new(RelationKind::ManyToMany)
        }
    }

    fn owned_by(mut self, owner_exists: bool) -> Self {
        self.owner_exists = owner_exists;
        self
    }
}

impl Relationship for MemoryRelation {
    fn kind(&self) -> RelationKind {
        self.kind
    }

    fn owner_exists(&self) -> bool {
        self.owner_exists
    }

    fn fetch_related(&self, query: &RelationQuery) -> anyhow::Result<Vec<RecordRef>> {
        match self.kind {
            RelationKind::OneToOne => Ok(self
                .related
                .first()
                .map(|record| record.clone().into_ref())
                .into_iter()
                .collect()),
            RelationKind::OneToMany => Ok(apply(query, &self.related)),
            // The association itself is not narrowed by the caller's query
            RelationKind::ManyToMany => Ok(apply(&RelationQuery::default(), &self.related)),
        }
    }

    fn fetch_candidates(&self, query: &RelationQuery) -> anyhow::Result<Vec<RecordRef>> {
        Ok(apply(query, &self.candidates))
    }

    fn is_associated(&self, candidate: &dyn Record) -> bool {
        let Some(key) = candidate.key() else {
            return false;
        };
        self.related
            .iter()
            .filter_map(|record| record.key())
            .any(|associated| loose_eq(&associated, &key))
    }
}

fn apply(query: &RelationQuery, records: &[MemoryRecord]) -> Vec<RecordRef> {
    let mut matched: Vec<&MemoryRecord> = records
        .iter()
        .filter(|record| {
            query.filters.iter().all(|filter| {
                record
                    .attributes
                    .get(&filter.field)
                    .is_some_and(|value| loose_eq(value, &filter.value))
            })
        })
        .collect();

    if let Some(order) = &query.order_by {
        matched.sort_by(|a, b| {
            let a = a.attributes.get(&order.field).unwrap_or(&Value::Null);
            let b = b.attributes.get(&order.field).unwrap_or(&Value::Null);
            let ordering = compare(a, b);
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    matched
        .into_iter()
        .take(limit)
        .map(|record| record.clone().into_ref())
        .collect()
}

/// Session holding a single anti-forgery token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySession {
    token: String,
}

impl MemorySession {
    /// A session with a freshly generated token
    pub fn new() -> Self {
        Self {
            token: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }

    /// Replace the token, invalidating previously rendered forms
    pub fn regenerate(&mut self) {
        self.token = uuid::Uuid::new_v4().simple().to_string();
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for MemorySession {
    fn current_token(&self) -> String {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags() -> Vec<MemoryRecord> {
        vec![
            MemoryRecord::new(json!({"id": 1, "name": "red"})),
            MemoryRecord::new(json!({"id": 2, "name": "green"})),
            MemoryRecord::new(json!({"id": 3, "name": "blue"})),
        ]
    }

    mod memory_record {
        use super::*;

        #[test]
        fn test_relation_accessor_outcomes() {
            let record = MemoryRecord::new(json!({"id": 1, "title": "x"}))
                .with_relation("tags", MemoryRelation::many_to_many(tags(), vec![]));

            assert!(matches!(record.relation("tags"), RelationAccessor::Relation(_)));
            assert!(matches!(record.relation("title"), RelationAccessor::NotARelation));
            assert!(matches!(record.relation("nope"), RelationAccessor::Missing));
        }

        #[test]
        fn test_relation_inherits_owner_existence() {
            let record = MemoryRecord::unsaved(json!({}))
                .with_relation("lines", MemoryRelation::one_to_many(vec![]));
            let RelationAccessor::Relation(relation) = record.relation("lines") else {
                panic!("expected a relation");
            };
            assert!(!relation.owner_exists());
        }

        #[test]
        fn test_one_to_one_reads_as_nested_record() {
            let address = MemoryRecord::new(json!({"city": "Oslo"}));
            let record = MemoryRecord::new(json!({"id": 1}))
                .with_relation("address", MemoryRelation::one_to_one(Some(address)));
            let data = BoundData::record(record);
            assert_eq!(data.lookup("address[city]"), Some(json!("Oslo")));
        }

        #[test]
        fn test_deserialize_defaults() {
            let record: MemoryRecord =
                serde_json::from_str(r#"{"attributes": {"id": 4}}"#).unwrap();
            assert!(record.exists);
            assert_eq!(record.key(), Some(json!(4)));
        }
    }

    mod memory_relation {
        use super::*;

        #[test]
        fn test_query_filters_orders_and_limits() {
            let relation = MemoryRelation::one_to_many(tags());
            let mut query = RelationQuery::default();
            query.order_by_desc("name").limit(2);

            let records = relation.fetch_related(&query).unwrap();
            let keys: Vec<_> = records.iter().filter_map(|r| r.key()).collect();
            assert_eq!(keys, vec![json!(1), json!(2)]);
        }

        #[test]
        fn test_query_filter_equality() {
            let relation = MemoryRelation::one_to_many(tags());
            let mut query = RelationQuery::default();
            query.where_eq("name", json!("blue"));

            let records = relation.fetch_related(&query).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].key(), Some(json!(3)));
        }

        #[test]
        fn test_membership_by_key() {
            let associated = vec![MemoryRecord::new(json!({"id": "2", "pivot": {"weight": 5}}))];
            let relation = MemoryRelation::many_to_many(tags(), associated);
            let candidates = relation.fetch_candidates(&RelationQuery::default()).unwrap();

            let selected: Vec<bool> = candidates
                .iter()
                .map(|c| relation.is_associated(c.as_ref()))
                .collect();
            assert_eq!(selected, vec![false, true, false]);
        }
    }

    mod memory_session {
        use super::*;

        #[test]
        fn test_new_sessions_get_distinct_tokens() {
            let a = MemorySession::new();
            let b = MemorySession::new();
            assert_ne!(a.current_token(), b.current_token());
            assert_eq!(a.current_token().len(), 32);
        }

        #[test]
        fn test_regenerate_changes_token() {
            let mut session = MemorySession::with_token("fixed");
            session.regenerate();
            assert_ne!(session.current_token(), "fixed");
        }
    }
}
