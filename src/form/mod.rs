//! Form composition: the node tree, key paths, value resolution and relations

mod error;
mod field;
mod node;
pub(crate) mod path;
mod relation;
mod resolve;
mod root;
mod snapshot;
mod system;
mod tree;

pub use error::{FormError, Result};
pub use field::{Field, FieldKind, Options, ValueSource};
pub use node::{formlet, BuildState, Configurator, FormNode, Formlet, NodeId, QueryCustomizer};
pub use path::{child_path, field_path, root_path};
pub use relation::RelationBinding;
pub use resolve::{resolve, Resolution};
pub use root::Form;
pub use snapshot::{BuildOutput, FieldSnapshot, NodeSnapshot};
pub use system::Method;
pub use tree::{FormTree, NodeRef, Prepare};
