//! The form tree arena and the build walk
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Ownership
//! is strictly top-down: a parent lists its children per group, a child only
//! remembers its parent's id.

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use super::error::{FormError, Result};
use super::field::Field;
use super::node::{BuildState, Configurator, FormNode, Formlet, NodeId, QueryCustomizer, RelationDecl, Slot};
use super::path;
use super::relation::{self, RelationBinding};
use super::resolve::resolve;
use crate::data::{BoundData, PriorInput, RecordRef};

#[derive(Debug)]
pub struct FormTree {
    nodes: Vec<FormNode>,
}

impl FormTree {
    pub(crate) fn new(root: Rc<dyn Formlet>, root_path: String) -> Self {
        Self {
            nodes: vec![FormNode::new(root, root_path)],
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root_id())
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn get(&self, id: NodeId) -> &FormNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut FormNode {
        &mut self.nodes[id.0]
    }

    /// Bound data of the node itself or, failing that, of its closest ancestor
    ///
    /// Nodes materialized from a relation only ever see their own binding.
    pub(crate) fn nearest_bound(&self, id: NodeId) -> Option<&BoundData> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.get(id);
            if let Some(bound) = &node.bound {
                return Some(bound);
            }
            if node.binding.is_some() {
                return None;
            }
            current = node.parent;
        }
        None
    }

    pub(crate) fn ensure_group(&mut self, parent: NodeId, group: &str) {
        self.node_mut(parent)
            .groups
            .entry(group.to_string())
            .or_default();
    }

    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        group: &str,
        formlet: Rc<dyn Formlet>,
        bound: Option<BoundData>,
        binding: Option<RelationBinding>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let index = self
            .get(parent)
            .groups
            .get(group)
            .map_or(0, |children| children.len());

        let mut child = FormNode::new(formlet, path::child_path(&self.get(parent).path, group, index));
        child.parent = Some(parent);
        child.slot = Some(Slot {
            group: group.to_string(),
            index,
        });
        child.bound = bound;
        child.binding = binding;
        self.nodes.push(child);

        self.node_mut(parent)
            .groups
            .entry(group.to_string())
            .or_default()
            .push(id);
        id
    }

    pub(crate) fn insert_field(&mut self, id: NodeId, field: Field) -> Result<&mut Field> {
        let node = self.node_mut(id);
        if node.fields.contains_key(field.name()) {
            return Err(FormError::DuplicateField {
                node: node.path.clone(),
                name: field.name().to_string(),
            });
        }
        let entry = node.fields.entry(field.name().to_string());
        Ok(entry.or_insert(field))
    }

    /// Build one node and everything below it
    ///
    /// Order: prepare hook, relation materialization, children (group order,
    /// then append order), then this node's own fields.
    pub(crate) fn build_node(&mut self, id: NodeId, prior: &PriorInput) -> Result<()> {
        match self.get(id).state {
            BuildState::Built => return Ok(()),
            BuildState::Building => {
                return Err(FormError::ReentrantBuild {
                    node: self.get(id).path.clone(),
                })
            }
            BuildState::Unbuilt => {}
        }
        self.node_mut(id).state = BuildState::Building;
        debug!(node = %self.get(id).path, "building form node");

        let formlet = Rc::clone(&self.get(id).formlet);
        formlet.prepare(&mut Prepare { tree: self, id })?;

        let relations = std::mem::take(&mut self.node_mut(id).relations);
        for decl in &relations {
            relation::materialize(self, id, decl)?;
        }

        let children: Vec<NodeId> = self.get(id).groups.values().flatten().copied().collect();
        for child in children {
            self.build_node(child, prior)?;
        }

        self.resolve_fields(id, prior);
        self.node_mut(id).state = BuildState::Built;
        debug!(node = %self.get(id).path, "built form node");
        Ok(())
    }

    fn resolve_fields(&mut self, id: NodeId, prior: &PriorInput) {
        let bound = self.nearest_bound(id);
        let node = self.get(id);
        let resolved: Vec<_> = node
            .fields
            .values()
            .filter(|field| !field.is_resolved())
            .map(|field| {
                let key_path = path::field_path(&node.path, field.name());
                let resolution = resolve(field, &key_path, prior, bound);
                (field.name().to_string(), key_path, resolution)
            })
            .collect();

        let node = self.node_mut(id);
        for (name, key_path, resolution) in resolved {
            trace!(field = %key_path, source = resolution.source.label(), "resolved field");
            if let Some(field) = node.fields.get_mut(&name) {
                field.resolve(key_path, resolution.value, resolution.source);
            }
        }
    }
}

/// Mutable view of the node being prepared
///
/// Handed to [`Formlet::prepare`]; this is where fields, groups and relations
/// get registered.
pub struct Prepare<'t> {
    tree: &'t mut FormTree,
    id: NodeId,
}

impl<'t> Prepare<'t> {
    /// Register a field; local names are unique per node
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        self.tree.insert_field(self.id, field).map(|_| ())
    }

    /// Register several fields in order
    pub fn add_fields(&mut self, fields: impl IntoIterator<Item = Field>) -> Result<()> {
        fields.into_iter().try_for_each(|field| self.add_field(field))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.tree.node_mut(self.id).fields.get_mut(name)
    }

    /// Append `count` children of `formlet` to `group`, running `configurator` on each
    ///
    /// Calling this again for the same group grows it.
    pub fn add_group(
        &mut self,
        group: &str,
        formlet: Rc<dyn Formlet>,
        count: usize,
        configurator: Option<Configurator>,
    ) -> Result<()> {
        self.tree.ensure_group(self.id, group);
        for _ in 0..count {
            let child = self
                .tree
                .push_child(self.id, group, Rc::clone(&formlet), None, None);
            if let Some(configure) = &configurator {
                configure(self.tree.node_mut(child))?;
            }
        }
        Ok(())
    }

    /// A single child in its own group
    pub fn add_formlet(&mut self, group: &str, formlet: Rc<dyn Formlet>) -> Result<()> {
        self.add_group(group, formlet, 1, None)
    }

    /// Record a relation to expand once this node's prepare hook returns
    pub fn declare_relation(
        &mut self,
        relation: &str,
        formlet: Rc<dyn Formlet>,
        customizer: Option<QueryCustomizer>,
        count: usize,
    ) {
        self.tree.node_mut(self.id).relations.push(RelationDecl {
            name: relation.to_string(),
            formlet,
            customizer,
            count,
        });
    }

    pub fn relation(&mut self, relation: &str, formlet: Rc<dyn Formlet>) {
        self.declare_relation(relation, formlet, None, 1);
    }

    /// Bind data to this node; allowed until its fields are resolved
    pub fn bind(&mut self, data: impl Into<BoundData>) -> Result<()> {
        self.tree.node_mut(self.id).model(data)
    }

    /// Data this node's fields will be filled from
    pub fn model(&self) -> Option<&BoundData> {
        self.tree.nearest_bound(self.id)
    }

    /// Record this node was materialized for
    pub fn related(&self) -> Option<RecordRef> {
        self.node().related().cloned()
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.tree.get(self.id).option(key)
    }

    pub fn path(&self) -> &str {
        &self.tree.get(self.id).path
    }

    pub fn node(&self) -> NodeRef<'_> {
        self.tree.node(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'_>> {
        self.node().parent()
    }
}

/// Read-only view of a node: the tree plus an id
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t FormTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn node(&self) -> &'t FormNode {
        self.tree.get(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &'t str {
        &self.node().path
    }

    /// Group name and index under the parent; `None` for the root
    pub fn slot(&self) -> Option<(&'t str, usize)> {
        self.node()
            .slot
            .as_ref()
            .map(|slot| (slot.group.as_str(), slot.index))
    }

    pub fn state(&self) -> BuildState {
        self.node().state
    }

    pub fn field(&self, name: &str) -> Option<&'t Field> {
        self.node().fields.get(name)
    }

    /// Visible fields in registration order, or the named fields in the given order
    ///
    /// Names that do not exist are skipped.
    pub fn fields(&self, names: Option<&[&str]>) -> Vec<&'t Field> {
        let fields = &self.node().fields;
        match names {
            Some(names) => names.iter().filter_map(|name| fields.get(*name)).collect(),
            None => fields.values().filter(|field| !field.is_hidden()).collect(),
        }
    }

    /// The hidden-fields namespace, system fields included
    pub fn hidden_fields(&self) -> Vec<&'t Field> {
        self.node()
            .fields
            .values()
            .filter(|field| field.is_hidden())
            .collect()
    }

    /// First node of a group
    pub fn formlet(&self, group: &str) -> Option<NodeRef<'t>> {
        self.node()
            .groups
            .get(group)
            .and_then(|children| children.first())
            .map(|id| self.tree.node(*id))
    }

    /// Nodes of one group, or of every group in order
    pub fn formlets(&self, group: Option<&str>) -> Vec<NodeRef<'t>> {
        let groups = &self.node().groups;
        let ids: Vec<NodeId> = match group {
            Some(group) => groups.get(group).cloned().unwrap_or_default(),
            None => groups.values().flatten().copied().collect(),
        };
        ids.into_iter().map(|id| self.tree.node(id)).collect()
    }

    pub fn group_names(&self) -> Vec<&'t str> {
        self.node().groups.keys().map(String::as_str).collect()
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node().parent.map(|id| self.tree.node(id))
    }

    /// Data bound to this node itself
    pub fn model(&self) -> Option<&'t BoundData> {
        self.node().bound.as_ref()
    }

    /// Data this node's fields are filled from
    pub fn nearest_model(&self) -> Option<&'t BoundData> {
        self.tree.nearest_bound(self.id)
    }

    pub fn binding(&self) -> Option<&'t RelationBinding> {
        self.node().binding.as_ref()
    }

    /// The record a relation child represents, distinct from its bound data
    pub fn related(&self) -> Option<&'t RecordRef> {
        self.binding().and_then(RelationBinding::related)
    }

    pub fn is_selected(&self) -> bool {
        self.binding().is_some_and(RelationBinding::is_selected)
    }

    pub fn option(&self, key: &str) -> Option<&'t Value> {
        self.node().option(key)
    }
}
