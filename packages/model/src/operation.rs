//! # Primitive Operations
//!
//! The only unit of mutation recorded in history. Operations returned by
//! the store carry the prior state they overwrote (the deleted node, the
//! previous value, the removed content), which makes [`ObjectOperation::invert`]
//! a pure transform.
//!
//! Operations built by hand (or deserialized from elsewhere) may lack that
//! captured state; they can still be applied, but not inverted.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::diff::Diff;
use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId};
use crate::path::PropertyPath;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ObjectOperation {
    Create {
        node: Node,
    },
    Delete {
        id: NodeId,
        /// Snapshot of the node at delete time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<Node>,
    },
    Set {
        path: PropertyPath,
        value: Value,
        /// Value before the set (`null` when the property was absent)
        #[serde(
            default,
            deserialize_with = "deserialize_some",
            skip_serializing_if = "Option::is_none"
        )]
        original: Option<Value>,
    },
    Update {
        path: PropertyPath,
        diff: Diff,
    },
}

impl ObjectOperation {
    pub fn create(node: Node) -> Self {
        ObjectOperation::Create { node }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        ObjectOperation::Delete {
            id: id.into(),
            node: None,
        }
    }

    pub fn set(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        ObjectOperation::Set {
            path: path.into(),
            value: value.into(),
            original: None,
        }
    }

    pub fn update(path: impl Into<PropertyPath>, diff: Diff) -> Self {
        ObjectOperation::Update {
            path: path.into(),
            diff,
        }
    }

    /// Id of the node this operation touches
    pub fn node_id(&self) -> &str {
        match self {
            ObjectOperation::Create { node } => &node.id,
            ObjectOperation::Delete { id, .. } => id,
            ObjectOperation::Set { path, .. } | ObjectOperation::Update { path, .. } => {
                path.node_id().unwrap_or_default()
            }
        }
    }

    /// Property path for `set` and `update`
    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            ObjectOperation::Set { path, .. } | ObjectOperation::Update { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectOperation::Create { .. } => "create",
            ObjectOperation::Delete { .. } => "delete",
            ObjectOperation::Set { .. } => "set",
            ObjectOperation::Update { .. } => "update",
        }
    }

    /// Builds the operation that undoes this one
    pub fn invert(&self) -> GraphResult<ObjectOperation> {
        match self {
            ObjectOperation::Create { node } => Ok(ObjectOperation::Delete {
                id: node.id.clone(),
                node: Some(node.clone()),
            }),
            ObjectOperation::Delete { node: Some(node), .. } => Ok(ObjectOperation::Create {
                node: node.clone(),
            }),
            ObjectOperation::Delete { id, node: None } => Err(GraphError::not_invertible(
                format!("delete of '{}' was recorded without a node snapshot", id),
            )),
            ObjectOperation::Set {
                path,
                value,
                original: Some(original),
            } => Ok(ObjectOperation::Set {
                path: path.clone(),
                value: original.clone(),
                original: Some(value.clone()),
            }),
            ObjectOperation::Set { path, original: None, .. } => Err(GraphError::not_invertible(
                format!("set of {} was recorded without its previous value", path),
            )),
            ObjectOperation::Update { path, diff } => Ok(ObjectOperation::Update {
                path: path.clone(),
                diff: diff.invert()?,
            }),
        }
    }
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
