//! # Graph Store
//!
//! Owns every node of a document and applies primitive operations to them.
//!
//! ## Guarantees
//!
//! - Validation happens before anything is touched: a failed operation
//!   leaves the node map and every index exactly as they were.
//! - After the node map changes, the registered indices are notified
//!   synchronously and in registration order, before the call returns.
//! - Each successful call returns the operation in recorded form, carrying
//!   the state it overwrote, so it can be inverted later.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::diff::Diff;
use crate::error::{GraphError, GraphResult};
use crate::index::{
    AnnotationIndex, ContainerAnnotationIndex, Index, IndexQuery, IndexRegistry, TypeIndex,
    ANNOTATION_INDEX, CONTAINER_ANNOTATION_INDEX, TYPE_INDEX,
};
use crate::node::{Node, NodeId};
use crate::operation::ObjectOperation;
use crate::path::PropertyPath;
use crate::schema::{NodeKind, Schema};
use crate::snapshot::Snapshot;

/// Addressable node storage
///
/// Implemented by the committed store and by the staging copy used during
/// transactions, so editing code can read and write either the same way.
pub trait NodeStore {
    fn schema(&self) -> &Schema;

    fn nodes(&self) -> &BTreeMap<NodeId, Node>;

    fn indices(&self) -> &IndexRegistry;

    fn create(&mut self, node: Node) -> GraphResult<ObjectOperation>;

    fn delete(&mut self, id: &str) -> GraphResult<ObjectOperation>;

    fn set(&mut self, path: &PropertyPath, value: Value) -> GraphResult<ObjectOperation>;

    fn update(&mut self, path: &PropertyPath, diff: Diff) -> GraphResult<ObjectOperation>;

    fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes().get(id)
    }

    fn contains(&self, id: &str) -> bool {
        self.nodes().contains_key(id)
    }

    /// Resolves a property path to its value
    fn get(&self, path: &PropertyPath) -> Option<&Value> {
        let (node_id, property, subpath) = path.split().ok()?;
        let mut value = self.nodes().get(node_id)?.get(property)?;
        for segment in subpath {
            value = child(value, segment)?;
        }
        Some(value)
    }

    /// Replays a (possibly recorded) operation
    fn apply(&mut self, op: &ObjectOperation) -> GraphResult<ObjectOperation> {
        match op {
            ObjectOperation::Create { node } => self.create(node.clone()),
            ObjectOperation::Delete { id, .. } => self.delete(id),
            ObjectOperation::Set { path, value, .. } => self.set(path, value.clone()),
            ObjectOperation::Update { path, diff } => self.update(path, diff.clone()),
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(self.schema(), self.nodes().clone())
    }
}

/// The committed node map and its indices
#[derive(Debug)]
pub struct GraphStore {
    schema: Arc<Schema>,
    nodes: BTreeMap<NodeId, Node>,
    indices: IndexRegistry,
}

impl GraphStore {
    /// Empty store without any index
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            nodes: BTreeMap::new(),
            indices: IndexRegistry::new(),
        }
    }

    /// Empty store with the type, annotation and container-annotation indices
    pub fn with_default_indices(schema: Arc<Schema>) -> Self {
        let mut indices = IndexRegistry::new();
        let defaults: [(&str, Box<dyn Index>); 3] = [
            (TYPE_INDEX, Box::new(TypeIndex::new())),
            (ANNOTATION_INDEX, Box::new(AnnotationIndex::new())),
            (CONTAINER_ANNOTATION_INDEX, Box::new(ContainerAnnotationIndex::new())),
        ];
        for (name, index) in defaults {
            // Fresh registry with distinct names cannot collide
            let _ = indices.add(name, index, std::iter::empty());
        }
        Self {
            schema,
            nodes: BTreeMap::new(),
            indices,
        }
    }

    /// Default-indexed store seeded with the nodes of a snapshot
    pub fn from_snapshot(schema: Arc<Schema>, snapshot: &Snapshot) -> GraphResult<Self> {
        let (name, version) = &snapshot.schema;
        if *name != schema.name || *version != schema.version {
            return Err(GraphError::SchemaMismatch {
                expected: schema.qualified_name(),
                found: format!("{}@{}", name, version),
            });
        }

        let mut store = Self::with_default_indices(schema);
        for node in snapshot.nodes.values() {
            store.create(node.clone())?;
        }
        debug!("Seeded store with {} nodes", store.len());
        Ok(store)
    }

    /// Registers an index, building it from the current nodes
    pub fn add_index(&mut self, name: impl Into<String>, index: Box<dyn Index>) -> GraphResult<()> {
        let schema = &self.schema;
        let nodes = self
            .nodes
            .values()
            .map(|node| (node, schema.kind_of(&node.node_type)));
        self.indices.add(name, index, nodes)
    }

    /// Typed access to a registered index
    pub fn index<T: Index>(&self, name: &str) -> Option<&T> {
        self.indices.get_as::<T>(name)
    }

    pub fn query_index(&self, name: &str, query: &IndexQuery<'_>) -> Option<Vec<NodeId>> {
        self.indices.get(name).map(|index| index.query(query))
    }

    pub fn type_index(&self) -> Option<&TypeIndex> {
        self.index(TYPE_INDEX)
    }

    pub fn annotation_index(&self) -> Option<&AnnotationIndex> {
        self.index(ANNOTATION_INDEX)
    }

    pub fn container_annotation_index(&self) -> Option<&ContainerAnnotationIndex> {
        self.index(CONTAINER_ANNOTATION_INDEX)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_property(&self, node: &Node, path: &PropertyPath, property: &str) -> GraphResult<()> {
        if property == "id" || property == "type" {
            return Err(GraphError::invalid_path(path, "id and type are immutable"));
        }
        match self.schema.node_type(&node.node_type) {
            Some(node_type) if !node_type.accepts(property) => Err(GraphError::invalid_path(
                path,
                format!("'{}' is not a property of type '{}'", property, node.node_type),
            )),
            _ => Ok(()),
        }
    }
}

impl NodeStore for GraphStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    fn indices(&self) -> &IndexRegistry {
        &self.indices
    }

    fn create(&mut self, node: Node) -> GraphResult<ObjectOperation> {
        let node = node.normalized();
        if node.id.is_empty() {
            return Err(GraphError::invalid_path(
                &PropertyPath::new([node.id.as_str()]),
                "node id must not be empty",
            ));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        let node_type = self
            .schema
            .node_type(&node.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node.node_type.clone()))?;
        if let Some(property) = node.properties.keys().find(|p| !node_type.accepts(p)) {
            return Err(GraphError::invalid_path(
                &PropertyPath::property(node.id.as_str(), property.as_str()),
                format!("'{}' is not a property of type '{}'", property, node.node_type),
            ));
        }
        let kind = node_type.kind;

        debug!("create {} ({})", node.id, node.node_type);
        let stored = self.nodes.entry(node.id.clone()).or_insert(node);
        self.indices.node_created(stored, kind);
        Ok(ObjectOperation::create(stored.clone()))
    }

    fn delete(&mut self, id: &str) -> GraphResult<ObjectOperation> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        let kind = self.schema.kind_of(&node.node_type);

        debug!("delete {} ({})", node.id, node.node_type);
        self.indices.node_deleted(&node, kind);
        Ok(ObjectOperation::Delete {
            id: node.id.clone(),
            node: Some(node),
        })
    }

    fn set(&mut self, path: &PropertyPath, value: Value) -> GraphResult<ObjectOperation> {
        let (node_id, property, subpath) = path.split()?;
        let existing = self
            .nodes
            .get(node_id)
            .ok_or_else(|| GraphError::NotFound(node_id.to_string()))?;
        self.check_property(existing, path, property)?;
        let before = existing.clone();
        let kind = self.schema.kind_of(&before.node_type);

        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NotFound(node_id.to_string()))?;
        let original = if subpath.is_empty() {
            node.set_property(property, value.clone())
        } else {
            set_nested(node, path, property, subpath, value.clone())?
        };

        debug!("set {}", path);
        self.indices.property_changed(&before, node, path, kind);
        Ok(ObjectOperation::Set {
            path: path.clone(),
            value,
            original: Some(original),
        })
    }

    fn update(&mut self, path: &PropertyPath, diff: Diff) -> GraphResult<ObjectOperation> {
        let (node_id, property, subpath) = path.split()?;
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NotFound(node_id.to_string()))?;
        let before = node.clone();
        let kind = self.schema.kind_of(&before.node_type);

        let mut target = node
            .properties
            .get_mut(property)
            .ok_or_else(|| GraphError::invalid_path(path, "property is not set"))?;
        for segment in subpath {
            target = child_mut(target, segment).ok_or_else(|| {
                GraphError::invalid_path(path, format!("segment '{}' does not resolve", segment))
            })?;
        }
        let diff = diff.apply(target)?;

        debug!("update {} at {}", path, diff.offset());
        self.indices.property_changed(&before, node, path, kind);
        Ok(ObjectOperation::Update {
            path: path.clone(),
            diff,
        })
    }
}

fn child<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'v>(value: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Assigns below a property; returns the previous value
fn set_nested(
    node: &mut Node,
    path: &PropertyPath,
    property: &str,
    subpath: &[String],
    value: Value,
) -> GraphResult<Value> {
    let Some((last, parents)) = subpath.split_last() else {
        return Ok(node.set_property(property, value));
    };
    let mut target = node
        .properties
        .get_mut(property)
        .ok_or_else(|| GraphError::invalid_path(path, "property is not set"))?;
    for segment in parents {
        target = child_mut(target, segment).ok_or_else(|| {
            GraphError::invalid_path(path, format!("segment '{}' does not resolve", segment))
        })?;
    }

    match target {
        Value::Object(map) => {
            let previous = if value.is_null() {
                map.remove(last)
            } else {
                map.insert(last.clone(), value)
            };
            Ok(previous.unwrap_or(Value::Null))
        }
        Value::Array(items) => {
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| GraphError::invalid_path(path, "array index out of range"))?;
            Ok(std::mem::replace(slot, value))
        }
        _ => Err(GraphError::invalid_path(path, "cannot address into a scalar value")),
    }
}
