//! # Property Paths
//!
//! Every value in the graph is addressed by a path of the form
//! `[node_id, property, subpath...]`. The first two segments select a
//! property of a node; any further segments walk into nested objects
//! (by key) or arrays (by index).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Address of a value inside a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path to a top-level property of a node
    pub fn property(node_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self(vec![node_id.into(), property.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn property_name(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Segments below the property (empty for top-level properties)
    pub fn subpath(&self) -> &[String] {
        self.0.get(2..).unwrap_or(&[])
    }

    /// The `[node_id, property]` prefix of this path
    pub fn property_path(&self) -> PropertyPath {
        Self(self.0.iter().take(2).cloned().collect())
    }

    /// Splits a well-formed path into node id, property name and subpath
    pub fn split(&self) -> GraphResult<(&str, &str, &[String])> {
        match self.0.as_slice() {
            [node_id, property, subpath @ ..] => {
                if node_id.is_empty() || property.is_empty() {
                    return Err(GraphError::invalid_path(self, "empty segment"));
                }
                Ok((node_id, property, subpath))
            }
            _ => Err(GraphError::invalid_path(
                self,
                "expected at least a node id and a property name",
            )),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join("."))
    }
}

impl From<Vec<String>> for PropertyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for PropertyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}
