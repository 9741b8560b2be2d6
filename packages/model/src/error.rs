use thiserror::Error;

use crate::path::PropertyPath;

pub type GraphResult<T> = Result<T, GraphError>;

/// Failures raised by the graph store, its operations and its indices
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PropertyPath, reason: String },

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("Invalid diff: {0}")]
    InvalidDiff(String),

    #[error("Operation is not invertible: {0}")]
    NotInvertible(String),

    #[error("Index '{0}' is already registered")]
    DuplicateIndex(String),

    #[error("Snapshot schema {found} does not match document schema {expected}")]
    SchemaMismatch { expected: String, found: String },
}

impl GraphError {
    pub fn invalid_path(path: &PropertyPath, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub fn invalid_diff(reason: impl Into<String>) -> Self {
        Self::InvalidDiff(reason.into())
    }

    pub fn not_invertible(reason: impl Into<String>) -> Self {
        Self::NotInvertible(reason.into())
    }
}
