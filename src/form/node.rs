//! Form nodes and the declarative surface form authors implement

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::error::{FormError, Result};
use super::field::Field;
use super::relation::RelationBinding;
use super::tree::Prepare;
use crate::data::{BoundData, RelationQuery};

/// Index of a node inside its [`FormTree`](super::FormTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Build lifecycle of a node
///
/// `Unbuilt -> Building -> Built`; a built node never goes back, and entering
/// `Building` twice is a reentrant call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    #[default]
    Unbuilt,
    Building,
    Built,
}

/// A reusable form fragment
///
/// `prepare` runs once per node instance during the build and registers the
/// node's fields, sub-form groups and relations.
pub trait Formlet {
    fn prepare(&self, form: &mut Prepare<'_>) -> Result<()>;
}

impl<F> Formlet for F
where
    F: Fn(&mut Prepare<'_>) -> Result<()>,
{
    fn prepare(&self, form: &mut Prepare<'_>) -> Result<()> {
        self(form)
    }
}

/// Wrap a closure as a shared formlet
pub fn formlet<F>(prepare: F) -> Rc<dyn Formlet>
where
    F: Fn(&mut Prepare<'_>) -> Result<()> + 'static,
{
    Rc::new(prepare)
}

/// Setup hook run on every child created by `add_group`
pub type Configurator = Rc<dyn Fn(&mut FormNode) -> Result<()>>;

/// Customizes the query a relation runs to find its records
pub type QueryCustomizer = Rc<dyn Fn(&mut RelationQuery)>;

/// A relation waiting to be expanded into child nodes
#[derive(Clone)]
pub(crate) struct RelationDecl {
    pub name: String,
    pub formlet: Rc<dyn Formlet>,
    pub customizer: Option<QueryCustomizer>,
    pub count: usize,
}

/// Position of a child inside its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub group: String,
    pub index: usize,
}

/// One node of a form tree
pub struct FormNode {
    pub(crate) formlet: Rc<dyn Formlet>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) slot: Option<Slot>,
    pub(crate) path: String,
    pub(crate) fields: IndexMap<String, Field>,
    pub(crate) groups: IndexMap<String, Vec<NodeId>>,
    pub(crate) relations: Vec<RelationDecl>,
    pub(crate) bound: Option<BoundData>,
    pub(crate) binding: Option<RelationBinding>,
    pub(crate) options: IndexMap<String, Value>,
    pub(crate) state: BuildState,
}

impl FormNode {
    pub(crate) fn new(formlet: Rc<dyn Formlet>, path: String) -> Self {
        Self {
            formlet,
            parent: None,
            slot: None,
            path,
            fields: IndexMap::new(),
            groups: IndexMap::new(),
            relations: Vec::new(),
            bound: None,
            binding: None,
            options: IndexMap::new(),
            state: BuildState::Unbuilt,
        }
    }

    /// Bind external data; must happen before the node is built
    pub fn model(&mut self, data: impl Into<BoundData>) -> Result<()> {
        if self.state == BuildState::Built {
            return Err(FormError::StaleBinding {
                node: self.path.clone(),
            });
        }
        self.bound = Some(data.into());
        Ok(())
    }

    /// Attach an option the node's `prepare` hook can read
    pub fn set_option(&mut self, key: &str, value: Value) {
        self.options.insert(key.to_string(), value);
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn is_built(&self) -> bool {
        self.state == BuildState::Built
    }

    pub fn bound_data(&self) -> Option<&BoundData> {
        self.bound.as_ref()
    }
}

impl fmt::Debug for FormNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormNode")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("groups", &self.groups)
            .field("bound", &self.bound)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}
