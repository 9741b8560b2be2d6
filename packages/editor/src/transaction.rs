//! # Transaction Document
//!
//! Staging copy of the committed store. Editing code mutates it during a
//! transaction and can read its own writes back through the same
//! [`NodeStore`] surface; every mutation is appended to an operation log
//! that becomes the [`DocumentChange`](crate::DocumentChange) on save.
//!
//! The staging copy lives as long as its document and is reused across
//! transactions. Between transactions it holds the same content as the
//! committed store.

use std::collections::BTreeMap;

use docgraph_model::{
    AnnotationIndex, ContainerAnnotationIndex, Diff, GraphResult, GraphStore, IndexRegistry, Node,
    NodeId, NodeStore, ObjectOperation, PropertyPath, Schema, TypeIndex,
};
use serde_json::Value;
use tracing::debug;

use crate::change::revert;

#[derive(Debug)]
pub struct TransactionDocument {
    store: GraphStore,
    ops: Vec<ObjectOperation>,
    before: Value,
}

impl TransactionDocument {
    pub(crate) fn new(store: GraphStore) -> Self {
        Self {
            store,
            ops: Vec::new(),
            before: Value::Null,
        }
    }

    /// State passed to `start_transaction`
    pub fn before(&self) -> &Value {
        &self.before
    }

    /// Operations staged so far, in application order
    pub fn operations(&self) -> &[ObjectOperation] {
        &self.ops
    }

    pub fn type_index(&self) -> Option<&TypeIndex> {
        self.store.type_index()
    }

    pub fn annotation_index(&self) -> Option<&AnnotationIndex> {
        self.store.annotation_index()
    }

    pub fn container_annotation_index(&self) -> Option<&ContainerAnnotationIndex> {
        self.store.container_annotation_index()
    }

    pub(crate) fn begin(&mut self, before: Value) {
        self.ops.clear();
        self.before = before;
    }

    pub(crate) fn take_before(&mut self) -> Value {
        std::mem::take(&mut self.before)
    }

    /// Drains the staged log; each transaction's log is consumed once
    pub(crate) fn get_operations(&mut self) -> Vec<ObjectOperation> {
        std::mem::take(&mut self.ops)
    }

    /// Reverts the staged operations and clears the log
    pub(crate) fn rollback(&mut self) {
        let ops = self.get_operations();
        debug!("Rolling back {} staged operations", ops.len());
        revert(&mut self.store, &ops);
        self.before = Value::Null;
    }

    /// Store access that bypasses the operation log (replays, index setup)
    pub(crate) fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    fn log(&mut self, op: ObjectOperation) -> ObjectOperation {
        self.ops.push(op.clone());
        op
    }
}

impl NodeStore for TransactionDocument {
    fn schema(&self) -> &Schema {
        self.store.schema()
    }

    fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        self.store.nodes()
    }

    fn indices(&self) -> &IndexRegistry {
        self.store.indices()
    }

    fn create(&mut self, node: Node) -> GraphResult<ObjectOperation> {
        let op = self.store.create(node)?;
        Ok(self.log(op))
    }

    fn delete(&mut self, id: &str) -> GraphResult<ObjectOperation> {
        let op = self.store.delete(id)?;
        Ok(self.log(op))
    }

    fn set(&mut self, path: &PropertyPath, value: Value) -> GraphResult<ObjectOperation> {
        let op = self.store.set(path, value)?;
        Ok(self.log(op))
    }

    fn update(&mut self, path: &PropertyPath, diff: Diff) -> GraphResult<ObjectOperation> {
        let op = self.store.update(path, diff)?;
        Ok(self.log(op))
    }
}
