//! # Secondary Indices
//!
//! Indices derive lookup structures from the node map and are maintained
//! incrementally by the store: every successful mutation calls the hooks of
//! every registered index, synchronously and in registration order, before
//! the mutation returns. Later indices can therefore rely on earlier ones
//! already being consistent.

mod annotation_index;
mod container_annotation_index;
mod type_index;

use std::any::Any;
use std::fmt;

use tracing::debug;

pub use annotation_index::{AnnotationEntry, AnnotationIndex};
pub use container_annotation_index::{
    ContainerAnchor, ContainerAnnotationEntry, ContainerAnnotationIndex,
};
pub use type_index::TypeIndex;

use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId};
use crate::path::PropertyPath;
use crate::schema::NodeKind;

/// Registry name of the [`TypeIndex`]
pub const TYPE_INDEX: &str = "type";
/// Registry name of the [`AnnotationIndex`]
pub const ANNOTATION_INDEX: &str = "annotations";
/// Registry name of the [`ContainerAnnotationIndex`]
pub const CONTAINER_ANNOTATION_INDEX: &str = "container-annotations";

/// Uniform query accepted by every index
///
/// Indices answer the shapes they understand and return an empty result for
/// the others.
#[derive(Debug, Clone, Copy)]
pub enum IndexQuery<'a> {
    /// Ids of nodes with this type
    Type(&'a str),
    /// Ids of annotations on `path` overlapping `[start, end)`
    Range {
        path: &'a PropertyPath,
        start: usize,
        end: usize,
    },
    /// Every tracked id, optionally restricted to one type
    All { node_type: Option<&'a str> },
}

/// Incrementally maintained secondary index
pub trait Index: Any + fmt::Debug {
    /// Whether nodes of this shape are tracked at all
    fn select(&self, _node: &Node, _kind: NodeKind) -> bool {
        true
    }

    fn on_create(&mut self, node: &Node, kind: NodeKind);

    fn on_delete(&mut self, node: &Node, kind: NodeKind);

    /// Called after a `set`/`update` with the node before and after the change.
    ///
    /// The default re-indexes the node.
    fn on_property_change(&mut self, before: &Node, after: &Node, _path: &PropertyPath, kind: NodeKind) {
        self.on_delete(before, kind);
        self.on_create(after, kind);
    }

    fn query(&self, query: &IndexQuery<'_>) -> Vec<NodeId>;

    /// Drops all derived state
    fn reset(&mut self);

    fn as_any(&self) -> &dyn Any;
}

/// Ordered, name-keyed collection of indices
#[derive(Debug, Default)]
pub struct IndexRegistry {
    entries: Vec<(String, Box<dyn Index>)>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an index and builds it from the given nodes
    pub fn add<'a>(
        &mut self,
        name: impl Into<String>,
        mut index: Box<dyn Index>,
        nodes: impl IntoIterator<Item = (&'a Node, NodeKind)>,
    ) -> GraphResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(GraphError::DuplicateIndex(name));
        }

        index.reset();
        for (node, kind) in nodes {
            if index.select(node, kind) {
                index.on_create(node, kind);
            }
        }

        debug!("Registered index '{}'", name);
        self.entries.push((name, index));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Index> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, index)| index.as_ref())
    }

    /// Looks up an index by name and downcasts it to its concrete type
    pub fn get_as<T: Index>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(|index| index.as_any().downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn node_created(&mut self, node: &Node, kind: NodeKind) {
        for (_, index) in &mut self.entries {
            if index.select(node, kind) {
                index.on_create(node, kind);
            }
        }
    }

    pub(crate) fn node_deleted(&mut self, node: &Node, kind: NodeKind) {
        for (_, index) in &mut self.entries {
            if index.select(node, kind) {
                index.on_delete(node, kind);
            }
        }
    }

    pub(crate) fn property_changed(
        &mut self,
        before: &Node,
        after: &Node,
        path: &PropertyPath,
        kind: NodeKind,
    ) {
        for (_, index) in &mut self.entries {
            if index.select(before, kind) || index.select(after, kind) {
                index.on_property_change(before, after, path, kind);
            }
        }
    }
}
