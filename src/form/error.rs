//! Errors raised while composing and building a form tree

use thiserror::Error;

/// Result alias used throughout the form engine
pub type Result<T> = std::result::Result<T, FormError>;

/// Everything that can abort a build
#[derive(Debug, Error)]
pub enum FormError {
    /// Two fields with the same local name were registered on one node
    #[error("field `{name}` is already registered on form node `{node}`")]
    DuplicateField { node: String, name: String },

    /// The bound data has no accessor with the declared relation name
    #[error("no relation named `{relation}` on the bound data")]
    UnknownRelation { relation: String },

    /// The accessor exists but is not a relationship
    #[error("accessor `{relation}` does not yield a relationship")]
    InvalidRelation { relation: String },

    /// The relationship collaborator failed while fetching records
    #[error("failed to query relation `{relation}`")]
    RelationQuery {
        relation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Data was bound to a node that has already been built
    #[error("cannot bind data to form node `{node}` after it has been built")]
    StaleBinding { node: String },

    /// `build()` was entered again while the node was still building
    #[error("form node `{node}` is already being built")]
    ReentrantBuild { node: String },

    /// A previous build failed; the tree must be discarded
    #[error("a previous build of this form failed, the tree can no longer be used")]
    Poisoned,

    /// A schema referenced a formlet that was never registered
    #[error("unknown formlet `{0}`")]
    UnknownFormlet(String),

    /// A schema nests itself, directly or through its descendants
    #[error("formlet `{0}` contains itself")]
    RecursiveFormlet(String),
}
