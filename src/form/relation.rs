//! Relation materializer
//!
//! Expands a relation declared on a node into concrete child nodes, one per
//! related record, mirroring the relationship's cardinality:
//!
//! - one-to-one: a single child, bound to the related record when the owner is
//!   persisted, unbound otherwise
//! - one-to-many: one child per related record when persisted, `count` blank
//!   children otherwise
//! - many-to-many: one child per candidate, always; when persisted the current
//!   association is fetched once and decides which children are selected
//!
//! Every record is fetched before the first child is created, so a failing
//! relation leaves its group empty.

use std::rc::Rc;

use tracing::debug;

use super::error::{FormError, Result};
use super::node::{NodeId, RelationDecl};
use super::tree::FormTree;
use crate::data::{
    loose_eq, BoundData, RecordRef, RelationAccessor, RelationKind, RelationQuery, Relationship,
};

/// Descriptor linking a materialized node to the relationship it came from
#[derive(Debug, Clone)]
pub enum RelationBinding {
    OneToOne {
        related: Option<RecordRef>,
    },
    OneToMany {
        /// `None` for the blank rows of an unsaved owner
        record: Option<RecordRef>,
    },
    ManyToMany {
        /// The candidate this node offers for selection
        related: RecordRef,
        /// The owner's current association, fetched once per relation
        associated: Option<Rc<Vec<RecordRef>>>,
        selected: bool,
    },
}

impl RelationBinding {
    pub fn kind(&self) -> RelationKind {
        match self {
            Self::OneToOne { .. } => RelationKind::OneToOne,
            Self::OneToMany { .. } => RelationKind::OneToMany,
            Self::ManyToMany { .. } => RelationKind::ManyToMany,
        }
    }

    /// The record this node represents
    pub fn related(&self) -> Option<&RecordRef> {
        match self {
            Self::OneToOne { related } => related.as_ref(),
            Self::OneToMany { record } => record.as_ref(),
            Self::ManyToMany { related, .. } => Some(related),
        }
    }

    /// Whether a many-to-many candidate is currently associated
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::ManyToMany { selected: true, .. })
    }

    pub fn associated(&self) -> Option<&[RecordRef]> {
        match self {
            Self::ManyToMany {
                associated: Some(associated),
                ..
            } => Some(associated.as_slice()),
            _ => None,
        }
    }
}

/// A child waiting to be attached
struct Pending {
    bound: Option<BoundData>,
    binding: RelationBinding,
}

pub(crate) fn materialize(tree: &mut FormTree, parent: NodeId, decl: &RelationDecl) -> Result<()> {
    let relationship = relationship(tree, parent, &decl.name)?;

    let mut query = RelationQuery::default();
    if let Some(customize) = &decl.customizer {
        customize(&mut query);
    }

    let fetch_failed = |source| FormError::RelationQuery {
        relation: decl.name.clone(),
        source,
    };

    let kind = relationship.kind();
    let pending = match kind {
        RelationKind::OneToOne => one_to_one(relationship.as_ref(), &query).map_err(fetch_failed)?,
        RelationKind::OneToMany => {
            one_to_many(relationship.as_ref(), &query, decl.count).map_err(fetch_failed)?
        }
        RelationKind::ManyToMany => {
            many_to_many(relationship.as_ref(), &query).map_err(fetch_failed)?
        }
    };

    debug!(
        relation = %decl.name,
        kind = kind.label(),
        children = pending.len(),
        "materialized relation"
    );

    // Declared relations always own a group, even when it stays empty
    tree.ensure_group(parent, &decl.name);
    for child in pending {
        tree.push_child(
            parent,
            &decl.name,
            Rc::clone(&decl.formlet),
            child.bound,
            Some(child.binding),
        );
    }
    Ok(())
}

fn relationship(tree: &FormTree, node: NodeId, name: &str) -> Result<Rc<dyn Relationship>> {
    let record = tree
        .nearest_bound(node)
        .and_then(BoundData::as_record)
        .ok_or_else(|| FormError::UnknownRelation {
            relation: name.to_string(),
        })?;

    match record.relation(name) {
        RelationAccessor::Relation(relationship) => Ok(relationship),
        RelationAccessor::NotARelation => Err(FormError::InvalidRelation {
            relation: name.to_string(),
        }),
        RelationAccessor::Missing => Err(FormError::UnknownRelation {
            relation: name.to_string(),
        }),
    }
}

fn one_to_one(relationship: &dyn Relationship, query: &RelationQuery) -> anyhow::Result<Vec<Pending>> {
    let related = if relationship.owner_exists() {
        relationship.fetch_related(query)?.into_iter().next()
    } else {
        None
    };
    Ok(vec![Pending {
        bound: related.clone().map(BoundData::Record),
        binding: RelationBinding::OneToOne { related },
    }])
}

fn one_to_many(
    relationship: &dyn Relationship,
    query: &RelationQuery,
    count: usize,
) -> anyhow::Result<Vec<Pending>> {
    if !relationship.owner_exists() {
        let blank = (0..count)
            .map(|_| Pending {
                bound: None,
                binding: RelationBinding::OneToMany { record: None },
            })
            .collect();
        return Ok(blank);
    }

    let records = relationship.fetch_related(query)?;
    Ok(records
        .into_iter()
        .map(|record| Pending {
            bound: Some(BoundData::Record(Rc::clone(&record))),
            binding: RelationBinding::OneToMany {
                record: Some(record),
            },
        })
        .collect())
}

fn many_to_many(
    relationship: &dyn Relationship,
    query: &RelationQuery,
) -> anyhow::Result<Vec<Pending>> {
    let candidates = relationship.fetch_candidates(query)?;
    let associated = if relationship.owner_exists() {
        Some(Rc::new(relationship.fetch_related(&RelationQuery::default())?))
    } else {
        None
    };

    Ok(candidates
        .into_iter()
        .map(|candidate| {
            let selected = associated.is_some() && relationship.is_associated(candidate.as_ref());
            // The associated record carries pivot values for the child's fields
            let bound = associated
                .as_deref()
                .filter(|_| selected)
                .and_then(|records| matching(records, &candidate))
                .map(BoundData::Record);
            Pending {
                bound,
                binding: RelationBinding::ManyToMany {
                    related: candidate,
                    associated: associated.clone(),
                    selected,
                },
            }
        })
        .collect())
}

fn matching(records: &[RecordRef], candidate: &RecordRef) -> Option<RecordRef> {
    let key = candidate.key()?;
    records
        .iter()
        .find(|record| record.key().is_some_and(|k| loose_eq(&k, &key)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemoryRecord, MemoryRelation, Record};
    use crate::form::node::formlet;
    use serde_json::json;

    fn tree_with(record: MemoryRecord) -> FormTree {
        let mut tree = FormTree::new(formlet(|_| Ok(())), String::new());
        tree.node_mut(tree.root_id()).bound = Some(BoundData::record(record));
        tree
    }

    fn decl(name: &str, count: usize) -> RelationDecl {
        RelationDecl {
            name: name.to_string(),
            formlet: formlet(|_| Ok(())),
            customizer: None,
            count,
        }
    }

    fn lines() -> Vec<MemoryRecord> {
        vec![
            MemoryRecord::new(json!({"id": 10, "sku": "A1"})),
            MemoryRecord::new(json!({"id": 11, "sku": "B2"})),
        ]
    }

    fn tags() -> Vec<MemoryRecord> {
        (1..=4)
            .map(|id| MemoryRecord::new(json!({"id": id, "name": format!("tag{id}")})))
            .collect()
    }

    #[derive(Debug)]
    struct FailingRelation;

    impl Relationship for FailingRelation {
        fn kind(&self) -> RelationKind {
            RelationKind::OneToMany
        }
        fn owner_exists(&self) -> bool {
            true
        }
        fn fetch_related(&self, _: &RelationQuery) -> anyhow::Result<Vec<RecordRef>> {
            Err(anyhow::anyhow!("database unavailable"))
        }
        fn fetch_candidates(&self, _: &RelationQuery) -> anyhow::Result<Vec<RecordRef>> {
            Ok(Vec::new())
        }
        fn is_associated(&self, _: &dyn Record) -> bool {
            false
        }
    }

    #[derive(Debug)]
    struct FailingOwner;

    impl Record for FailingOwner {
        fn get(&self, _: &str) -> Option<BoundData> {
            None
        }
        fn relation(&self, _: &str) -> RelationAccessor {
            RelationAccessor::Relation(Rc::new(FailingRelation))
        }
        fn exists(&self) -> bool {
            true
        }
        fn key(&self) -> Option<serde_json::Value> {
            None
        }
    }

    mod one_to_one {
        use super::*;

        #[test]
        fn test_persisted_owner_binds_related() {
            let address = MemoryRecord::new(json!({"id": 5, "city": "Oslo"}));
            let mut tree = tree_with(
                MemoryRecord::new(json!({"id": 1}))
                    .with_relation("address", MemoryRelation::one_to_one(Some(address))),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("address", 1)).unwrap();

            let children = tree.root().formlets(Some("address"));
            assert_eq!(children.len(), 1);
            let child = children[0];
            assert_eq!(child.model().and_then(|d| d.lookup("city")), Some(json!("Oslo")));
            assert_eq!(child.binding().map(|b| b.kind()), Some(RelationKind::OneToOne));
        }

        #[test]
        fn test_unsaved_owner_gets_one_blank_child() {
            let address = MemoryRecord::new(json!({"id": 5}));
            let mut tree = tree_with(
                MemoryRecord::unsaved(json!({}))
                    .with_relation("address", MemoryRelation::one_to_one(Some(address))),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("address", 3)).unwrap();

            let children = tree.root().formlets(Some("address"));
            assert_eq!(children.len(), 1);
            assert!(children[0].model().is_none());
            assert!(children[0].related().is_none());
        }
    }

    mod one_to_many {
        use super::*;

        #[test]
        fn test_one_child_per_record_in_query_order() {
            let mut tree = tree_with(
                MemoryRecord::new(json!({"id": 1}))
                    .with_relation("lines", MemoryRelation::one_to_many(lines())),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("lines", 1)).unwrap();

            let children = tree.root().formlets(Some("lines"));
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].path(), "lines[0]");
            assert_eq!(children[1].path(), "lines[1]");
            assert_eq!(children[0].model().and_then(|d| d.lookup("sku")), Some(json!("A1")));
            assert_eq!(children[1].model().and_then(|d| d.lookup("sku")), Some(json!("B2")));
        }

        #[test]
        fn test_customizer_shapes_query() {
            let mut tree = tree_with(
                MemoryRecord::new(json!({"id": 1}))
                    .with_relation("lines", MemoryRelation::one_to_many(lines())),
            );
            let root = tree.root_id();
            let mut declared = decl("lines", 1);
            declared.customizer = Some(Rc::new(|query: &mut RelationQuery| {
                query.order_by_desc("sku");
            }));
            materialize(&mut tree, root, &declared).unwrap();

            let skus: Vec<_> = tree
                .root()
                .formlets(Some("lines"))
                .iter()
                .filter_map(|c| c.model().and_then(|d| d.lookup("sku")))
                .collect();
            assert_eq!(skus, vec![json!("B2"), json!("A1")]);
        }

        #[test]
        fn test_unsaved_owner_gets_count_blank_rows() {
            let mut tree = tree_with(
                MemoryRecord::unsaved(json!({"name": "draft"}))
                    .with_relation("lines", MemoryRelation::one_to_many(lines())),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("lines", 3)).unwrap();

            let children = tree.root().formlets(Some("lines"));
            assert_eq!(children.len(), 3);
            assert!(children.iter().all(|c| c.model().is_none()));
            // Blank rows never inherit the owner's data
            assert!(children.iter().all(|c| c.nearest_model().is_none()));
        }

        #[test]
        fn test_fetch_failure_leaves_group_empty() {
            let mut tree = FormTree::new(formlet(|_| Ok(())), String::new());
            let root = tree.root_id();
            tree.node_mut(root).bound = Some(BoundData::record(FailingOwner));

            let err = materialize(&mut tree, root, &decl("lines", 1)).unwrap_err();
            assert!(matches!(err, FormError::RelationQuery { ref relation, .. } if relation == "lines"));
            assert!(tree.root().formlets(Some("lines")).is_empty());
        }
    }

    mod many_to_many {
        use super::*;

        #[test]
        fn test_every_candidate_with_selection_state() {
            let associated = vec![MemoryRecord::new(json!({"id": 3, "pivot": {"weight": 9}}))];
            let mut tree = tree_with(
                MemoryRecord::new(json!({"id": 1}))
                    .with_relation("tags", MemoryRelation::many_to_many(tags(), associated)),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("tags", 1)).unwrap();

            let children = tree.root().formlets(Some("tags"));
            assert_eq!(children.len(), 4);

            let selected: Vec<bool> = children.iter().map(|c| c.is_selected()).collect();
            assert_eq!(selected, vec![false, false, true, false]);

            let names: Vec<_> = children
                .iter()
                .filter_map(|c| c.related().map(|r| BoundData::Record(Rc::clone(r))))
                .filter_map(|d| d.lookup("name"))
                .collect();
            assert_eq!(names, vec![json!("tag1"), json!("tag2"), json!("tag3"), json!("tag4")]);

            // Only the associated child is bound, to the pivot-carrying record
            assert_eq!(
                children[2].model().and_then(|d| d.lookup("pivot[weight]")),
                Some(json!(9))
            );
            assert!(children[0].model().is_none());
            assert_eq!(children[0].binding().and_then(|b| b.associated()).map(|a| a.len()), Some(1));
        }

        #[test]
        fn test_unsaved_owner_lists_candidates_unselected() {
            let mut tree = tree_with(
                MemoryRecord::unsaved(json!({}))
                    .with_relation("tags", MemoryRelation::many_to_many(tags(), vec![])),
            );
            let root = tree.root_id();
            materialize(&mut tree, root, &decl("tags", 1)).unwrap();

            let children = tree.root().formlets(Some("tags"));
            assert_eq!(children.len(), 4);
            assert!(children.iter().all(|c| !c.is_selected()));
            assert!(children.iter().all(|c| c.binding().and_then(|b| b.associated()).is_none()));
        }
    }

    mod lookup_errors {
        use super::*;

        #[test]
        fn test_unknown_relation() {
            let mut tree = tree_with(MemoryRecord::new(json!({"id": 1})));
            let root = tree.root_id();
            let err = materialize(&mut tree, root, &decl("ghosts", 1)).unwrap_err();
            assert!(matches!(err, FormError::UnknownRelation { ref relation } if relation == "ghosts"));
            assert!(tree.root().formlets(Some("ghosts")).is_empty());
        }

        #[test]
        fn test_plain_property_is_invalid_relation() {
            let mut tree = tree_with(MemoryRecord::new(json!({"id": 1, "title": "x"})));
            let root = tree.root_id();
            let err = materialize(&mut tree, root, &decl("title", 1)).unwrap_err();
            assert!(matches!(err, FormError::InvalidRelation { .. }));
            assert!(tree.root().formlets(Some("title")).is_empty());
        }

        #[test]
        fn test_plain_json_has_no_relations() {
            let mut tree = FormTree::new(formlet(|_| Ok(())), String::new());
            let root = tree.root_id();
            tree.node_mut(root).bound = Some(BoundData::from(json!({"lines": []})));
            let err = materialize(&mut tree, root, &decl("lines", 1)).unwrap_err();
            assert!(matches!(err, FormError::UnknownRelation { .. }));
        }
    }
}
