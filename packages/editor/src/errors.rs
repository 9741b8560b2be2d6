//! Error types for the editor

use docgraph_model::GraphError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Nested transactions are not supported")]
    NestedTransaction,

    #[error("Not in a transaction")]
    NotInTransaction,

    #[error("Cannot replay a document change during a transaction")]
    ReplayDuringTransaction,

    #[error("Container required for a container selection")]
    ContainerRequired,

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Container with id '{0}' already exists")]
    DuplicateContainer(String),
}
