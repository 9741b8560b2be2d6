//! # Document Changes
//!
//! A [`DocumentChange`] is the record of one committed transaction: the
//! operations in the order they were applied, plus the caller's opaque
//! before/after state (typically selections). Changes are immutable; undo
//! works by building the inverse change and applying it.

use std::collections::HashSet;

use docgraph_model::{GraphResult, NodeStore, ObjectOperation, PropertyPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Extra information handed to listeners along with a change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Set for undo/redo, so views can tell a replay from a fresh edit
    #[serde(default)]
    pub replay: bool,

    /// Caller-supplied payload
    #[serde(default)]
    pub data: Value,
}

impl ChangeInfo {
    pub fn replay() -> Self {
        Self {
            replay: true,
            data: Value::Null,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self { replay: false, data }
    }
}

/// Immutable, invertible record of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    ops: Vec<ObjectOperation>,
    before: Value,
    after: Value,
}

impl DocumentChange {
    pub fn new(ops: Vec<ObjectOperation>, before: Value, after: Value) -> Self {
        Self { ops, before, after }
    }

    pub fn ops(&self) -> &[ObjectOperation] {
        &self.ops
    }

    pub fn before(&self) -> &Value {
        &self.before
    }

    pub fn after(&self) -> &Value {
        &self.after
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Builds the change that undoes this one.
    ///
    /// Operations are inverted individually and in reverse order;
    /// before and after state are swapped.
    pub fn invert(&self) -> GraphResult<DocumentChange> {
        let ops = self
            .ops
            .iter()
            .rev()
            .map(ObjectOperation::invert)
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(DocumentChange {
            ops,
            before: self.after.clone(),
            after: self.before.clone(),
        })
    }

    /// Applies every operation to `store`, all or nothing.
    ///
    /// If an operation fails, the ones already applied are reverted before
    /// the error is returned. On success the operations are returned in
    /// recorded form.
    pub fn apply_to<S: NodeStore + ?Sized>(&self, store: &mut S) -> GraphResult<Vec<ObjectOperation>> {
        let mut applied = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            match store.apply(op) {
                Ok(recorded) => applied.push(recorded),
                Err(err) => {
                    revert(store, &applied);
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }

    /// Ids of nodes created by this change, in order
    pub fn created(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter(|op| matches!(op, ObjectOperation::Create { .. }))
            .map(ObjectOperation::node_id)
            .collect()
    }

    /// Ids of nodes deleted by this change, in order
    pub fn deleted(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter(|op| matches!(op, ObjectOperation::Delete { .. }))
            .map(ObjectOperation::node_id)
            .collect()
    }

    /// Property paths touched by `set`/`update`, deduplicated, first-seen order
    pub fn updated_paths(&self) -> Vec<PropertyPath> {
        let mut seen = HashSet::new();
        self.ops
            .iter()
            .filter_map(ObjectOperation::path)
            .map(PropertyPath::property_path)
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Whether the property at `path` (or the node owning it) was touched
    pub fn is_affected(&self, path: &PropertyPath) -> bool {
        let property = path.property_path();
        let node_id = path.node_id().unwrap_or_default();
        self.ops.iter().any(|op| match op.path() {
            Some(op_path) => op_path.property_path() == property,
            None => op.node_id() == node_id,
        })
    }
}

/// Best-effort rollback of already-applied operations
pub(crate) fn revert<S: NodeStore + ?Sized>(store: &mut S, applied: &[ObjectOperation]) {
    for op in applied.iter().rev() {
        let reverted = op.invert().and_then(|inverse| store.apply(&inverse));
        if let Err(err) = reverted {
            warn!("Failed to revert {} on '{}': {}", op.name(), op.node_id(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_model::{Diff, GraphError, GraphStore, Node, NodeType, Schema};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> GraphStore {
        let schema = Schema::new("test", "1")
            .with_type("paragraph", NodeType::new(["text"]))
            .with_type("bold", NodeType::property_annotation());
        GraphStore::with_default_indices(Arc::new(schema))
    }

    fn record(store: &mut GraphStore) -> DocumentChange {
        let ops = vec![
            store
                .create(Node::new("p1", "paragraph").with("text", "hello"))
                .unwrap(),
            store
                .update(&PropertyPath::from(["p1", "text"]), Diff::insert_text(5, "!"))
                .unwrap(),
            store
                .create(Node::new("p2", "paragraph").with("text", "bye"))
                .unwrap(),
            store
                .set(&PropertyPath::from(["p2", "text"]), json!("ciao"))
                .unwrap(),
            store.delete("p2").unwrap(),
        ];
        DocumentChange::new(ops, json!({"cursor": 0}), json!({"cursor": 6}))
    }

    #[test]
    fn test_invert_restores_store() {
        let mut store = store();
        let change = record(&mut store);
        assert_eq!(store.len(), 1);

        let inverse = change.invert().unwrap();
        assert_eq!(inverse.before(), &json!({"cursor": 6}));
        assert_eq!(inverse.after(), &json!({"cursor": 0}));
        assert_eq!(inverse.len(), change.len());

        inverse.apply_to(&mut store).unwrap();
        assert!(store.is_empty());
        assert!(store.type_index().unwrap().get("paragraph").is_empty());

        change.apply_to(&mut store).unwrap();
        assert_eq!(
            store.get(&PropertyPath::from(["p1", "text"])),
            Some(&json!("hello!"))
        );
    }

    #[test]
    fn test_inverting_twice_yields_original() {
        let mut store = store();
        let change = record(&mut store);
        assert_eq!(change.invert().unwrap().invert().unwrap(), change);
    }

    #[test]
    fn test_invert_requires_captured_state() {
        let change = DocumentChange::new(
            vec![ObjectOperation::delete("p1")],
            Value::Null,
            Value::Null,
        );
        assert!(matches!(change.invert(), Err(GraphError::NotInvertible(_))));
    }

    #[test]
    fn test_failed_apply_rolls_back() {
        let mut store = store();
        let change = DocumentChange::new(
            vec![
                ObjectOperation::create(Node::new("p1", "paragraph")),
                ObjectOperation::delete("missing"),
            ],
            Value::Null,
            Value::Null,
        );
        assert_eq!(
            change.apply_to(&mut store),
            Err(GraphError::NotFound("missing".into()))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_affected_paths() {
        let mut store = store();
        let change = record(&mut store);

        assert_eq!(change.created(), vec!["p1", "p2"]);
        assert_eq!(change.deleted(), vec!["p2"]);
        assert_eq!(
            change.updated_paths(),
            vec![
                PropertyPath::from(["p1", "text"]),
                PropertyPath::from(["p2", "text"])
            ]
        );
        assert!(change.is_affected(&PropertyPath::from(["p1", "text"])));
        assert!(change.is_affected(&PropertyPath::from(["p2", "title"])));
        assert!(!change.is_affected(&PropertyPath::from(["p3", "text"])));
    }
}
