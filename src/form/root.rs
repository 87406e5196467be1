//! The root form
//!
//! `Form` owns the tree and everything the build needs from outside it: the
//! prior submission, the session, the verb and the configuration.

use std::rc::Rc;

use tracing::debug;

use super::error::{FormError, Result};
use super::field::Field;
use super::node::Formlet;
use super::path;
use super::snapshot::{BuildOutput, NodeSnapshot};
use super::system::{Method, SystemFields};
use super::tree::{FormTree, NodeRef};
use crate::config::FormletsConfig;
use crate::data::{BoundData, PriorInput, TokenSource};

pub struct Form {
    tree: FormTree,
    prefix: Option<String>,
    method: Method,
    spam_trap: Option<bool>,
    prior: PriorInput,
    session: Option<Rc<dyn TokenSource>>,
    config: FormletsConfig,
    output: Option<BuildOutput>,
    poisoned: bool,
}

impl Form {
    pub fn new(formlet: impl Formlet + 'static) -> Self {
        Self::from_rc(Rc::new(formlet))
    }

    pub fn from_rc(formlet: Rc<dyn Formlet>) -> Self {
        Self {
            tree: FormTree::new(formlet, path::root_path(None)),
            prefix: None,
            method: Method::default(),
            spam_trap: None,
            prior: PriorInput::default(),
            session: None,
            config: FormletsConfig::default(),
            output: None,
            poisoned: false,
        }
    }

    /// Namespace every key path under `prefix:`
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string()).filter(|p| !p.is_empty());
        let root = self.tree.root_id();
        self.tree.node_mut(root).path = path::root_path(self.prefix.as_deref());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Override the configured spam trap switch for this form
    pub fn spam_trap(mut self, enabled: bool) -> Self {
        self.spam_trap = Some(enabled);
        self
    }

    pub fn prior_input(mut self, prior: impl Into<PriorInput>) -> Self {
        self.prior = prior.into();
        self
    }

    pub fn session(mut self, session: Rc<dyn TokenSource>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn config(mut self, config: FormletsConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind data to the root node; fails once the form is built or poisoned
    pub fn model(&mut self, data: impl Into<BoundData>) -> Result<()> {
        if self.poisoned {
            return Err(FormError::Poisoned);
        }
        let root = self.tree.root_id();
        self.tree.node_mut(root).model(data)
    }

    pub fn with_model(mut self, data: impl Into<BoundData>) -> Result<Self> {
        self.model(data)?;
        Ok(self)
    }

    /// Build the whole tree once; later calls return the cached output
    ///
    /// A failed build leaves the tree half built and every later call fails
    /// with [`FormError::Poisoned`].
    pub fn build(&mut self) -> Result<&BuildOutput> {
        if self.poisoned {
            return Err(FormError::Poisoned);
        }
        if self.output.is_none() {
            match self.run_build() {
                Ok(output) => self.output = Some(output),
                Err(err) => {
                    self.poisoned = true;
                    return Err(err);
                }
            }
        }
        self.output.as_ref().ok_or(FormError::Poisoned)
    }

    fn run_build(&mut self) -> Result<BuildOutput> {
        let root = self.tree.root_id();
        debug!(prefix = ?self.prefix, method = %self.method, "building form");

        self.tree.build_node(root, &self.prior)?;
        SystemFields {
            method: self.method,
            spam_trap: self.spam_trap.unwrap_or(self.config.spam_trap),
            config: &self.config,
            session: self.session.as_deref(),
        }
        .inject(&mut self.tree, root)?;

        debug!(nodes = self.tree.len(), "form built");
        Ok(BuildOutput {
            method: self.method,
            form_method: self.method.form_method(),
            root: NodeSnapshot::capture(self.tree.root()),
        })
    }

    pub fn output(&self) -> Option<&BuildOutput> {
        self.output.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.output.is_some()
    }

    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.tree.root()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.root().field(name)
    }

    pub fn fields(&self, names: Option<&[&str]>) -> Vec<&Field> {
        self.root().fields(names)
    }

    pub fn hidden_fields(&self) -> Vec<&Field> {
        self.root().hidden_fields()
    }

    pub fn formlet(&self, group: &str) -> Option<NodeRef<'_>> {
        self.root().formlet(group)
    }

    pub fn formlets(&self, group: Option<&str>) -> Vec<NodeRef<'_>> {
        self.root().formlets(group)
    }

    pub fn method_value(&self) -> Method {
        self.method
    }

    pub fn prefix_value(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("prefix", &self.prefix)
            .field("method", &self.method)
            .field("spam_trap", &self.spam_trap)
            .field("built", &self.is_built())
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}
