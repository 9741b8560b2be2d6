use std::any::Any;
use std::collections::{HashMap, HashSet};

use crate::index::{Index, IndexQuery};
use crate::node::{Node, NodeId};
use crate::path::PropertyPath;
use crate::schema::NodeKind;

/// Node ids grouped by declared type
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    by_type: HashMap<String, HashSet<NodeId>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all nodes with the given type, sorted
    pub fn get(&self, node_type: &str) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .by_type
            .get(node_type)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn contains(&self, node_type: &str, id: &str) -> bool {
        self.by_type
            .get(node_type)
            .is_some_and(|ids| ids.contains(id))
    }

    pub fn count(&self, node_type: &str) -> usize {
        self.by_type.get(node_type).map_or(0, HashSet::len)
    }

    /// Known types with at least one node, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Index for TypeIndex {
    fn on_create(&mut self, node: &Node, _kind: NodeKind) {
        self.by_type
            .entry(node.node_type.clone())
            .or_default()
            .insert(node.id.clone());
    }

    fn on_delete(&mut self, node: &Node, _kind: NodeKind) {
        if let Some(ids) = self.by_type.get_mut(&node.node_type) {
            ids.remove(&node.id);
            if ids.is_empty() {
                self.by_type.remove(&node.node_type);
            }
        }
    }

    // Types are immutable once a node exists
    fn on_property_change(&mut self, _: &Node, _: &Node, _: &PropertyPath, _: NodeKind) {}

    fn query(&self, query: &IndexQuery<'_>) -> Vec<NodeId> {
        match query {
            IndexQuery::Type(node_type) | IndexQuery::All { node_type: Some(node_type) } => {
                self.get(node_type)
            }
            IndexQuery::All { node_type: None } => {
                let mut ids: Vec<NodeId> = self.by_type.values().flatten().cloned().collect();
                ids.sort();
                ids
            }
            IndexQuery::Range { .. } => Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.by_type.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_creates_and_deletes() {
        let mut index = TypeIndex::new();
        let p1 = Node::new("p1", "paragraph");
        let p2 = Node::new("p2", "paragraph");
        let h1 = Node::new("h1", "heading");

        index.on_create(&p1, NodeKind::Node);
        index.on_create(&p2, NodeKind::Node);
        index.on_create(&h1, NodeKind::Node);
        assert_eq!(index.get("paragraph"), vec!["p1", "p2"]);
        assert_eq!(index.types(), vec!["heading", "paragraph"]);

        index.on_delete(&p1, NodeKind::Node);
        assert_eq!(index.get("paragraph"), vec!["p2"]);
        assert!(!index.contains("paragraph", "p1"));

        index.on_delete(&h1, NodeKind::Node);
        assert!(index.get("heading").is_empty());
        assert_eq!(index.types(), vec!["paragraph"]);
    }

    #[test]
    fn test_uniform_query() {
        let mut index = TypeIndex::new();
        index.on_create(&Node::new("p1", "paragraph"), NodeKind::Node);
        index.on_create(&Node::new("b1", "bold"), NodeKind::PropertyAnnotation);

        assert_eq!(index.query(&IndexQuery::Type("bold")), vec!["b1"]);
        assert_eq!(index.query(&IndexQuery::All { node_type: None }), vec!["b1", "p1"]);
    }
}
