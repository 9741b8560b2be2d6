use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::index::{Index, IndexQuery};
use crate::node::{Node, NodeId};
use crate::path::PropertyPath;
use crate::schema::{NodeKind, CONTAINER_ANNOTATION_PROPERTIES};

/// Span of a container annotation, possibly crossing node boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAnchor {
    pub container: String,
    pub start_path: PropertyPath,
    pub start_offset: usize,
    pub end_path: PropertyPath,
    pub end_offset: usize,
}

impl ContainerAnchor {
    /// Reads the anchor fields of a container annotation node
    pub fn from_node(node: &Node) -> Option<Self> {
        Some(Self {
            container: node.get_str("container")?.to_string(),
            start_path: serde_json::from_value(node.get("startPath")?.clone()).ok()?,
            start_offset: node.get_offset("startOffset")?,
            end_path: serde_json::from_value(node.get("endPath")?.clone()).ok()?,
            end_offset: node.get_offset("endOffset")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerAnnotationEntry {
    pub id: NodeId,
    pub node_type: String,
    pub anchor: ContainerAnchor,
}

/// Candidate store for container-scoped annotations
///
/// Overlap needs container geometry this crate does not own, so the index
/// only hands out candidates; callers test them against a container.
#[derive(Debug, Clone, Default)]
pub struct ContainerAnnotationIndex {
    by_id: BTreeMap<NodeId, ContainerAnnotationEntry>,
}

impl ContainerAnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// All candidates in id order, optionally restricted to one type
    pub fn get(&self, node_type: Option<&str>) -> Vec<&ContainerAnnotationEntry> {
        self.by_id
            .values()
            .filter(|entry| node_type.map_or(true, |t| entry.node_type == t))
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ContainerAnnotationEntry> {
        self.by_id.get(id)
    }

    /// Candidates anchored in the given container
    pub fn in_container(&self, container: &str) -> Vec<&ContainerAnnotationEntry> {
        self.by_id
            .values()
            .filter(|entry| entry.anchor.container == container)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Index for ContainerAnnotationIndex {
    fn select(&self, _node: &Node, kind: NodeKind) -> bool {
        kind == NodeKind::ContainerAnnotation
    }

    fn on_create(&mut self, node: &Node, _kind: NodeKind) {
        match ContainerAnchor::from_node(node) {
            Some(anchor) => {
                self.by_id.insert(
                    node.id.clone(),
                    ContainerAnnotationEntry {
                        id: node.id.clone(),
                        node_type: node.node_type.clone(),
                        anchor,
                    },
                );
            }
            None => warn!("Container annotation '{}' has no valid anchor, not indexed", node.id),
        }
    }

    fn on_delete(&mut self, node: &Node, _kind: NodeKind) {
        self.by_id.remove(&node.id);
    }

    fn on_property_change(&mut self, before: &Node, after: &Node, path: &PropertyPath, kind: NodeKind) {
        let touches_anchor = path
            .property_name()
            .is_some_and(|property| CONTAINER_ANNOTATION_PROPERTIES.contains(&property));
        if touches_anchor {
            self.on_delete(before, kind);
            self.on_create(after, kind);
        }
    }

    fn query(&self, query: &IndexQuery<'_>) -> Vec<NodeId> {
        let node_type = match query {
            IndexQuery::Type(node_type) => Some(*node_type),
            IndexQuery::All { node_type } => *node_type,
            IndexQuery::Range { .. } => return Vec::new(),
        };
        self.get(node_type)
            .into_iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    fn reset(&mut self) {
        self.by_id.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: &str, node_type: &str) -> Node {
        Node::new(id, node_type)
            .with("container", "body")
            .with("startPath", json!(["p1", "text"]))
            .with("startOffset", 2)
            .with("endPath", json!(["p3", "text"]))
            .with("endOffset", 1)
    }

    #[test]
    fn test_reads_anchor() {
        let anchor = ContainerAnchor::from_node(&comment("c1", "comment")).unwrap();
        assert_eq!(anchor.container, "body");
        assert_eq!(anchor.start_path, PropertyPath::from(["p1", "text"]));
        assert_eq!(anchor.end_offset, 1);

        assert!(ContainerAnchor::from_node(&Node::new("c2", "comment")).is_none());
    }

    #[test]
    fn test_candidates_filtered_by_type() {
        let mut index = ContainerAnnotationIndex::new();
        index.on_create(&comment("c1", "comment"), NodeKind::ContainerAnnotation);
        index.on_create(&comment("h1", "highlight"), NodeKind::ContainerAnnotation);

        assert_eq!(index.len(), 2);
        assert_eq!(index.query(&IndexQuery::Type("comment")), vec!["c1"]);
        assert_eq!(index.query(&IndexQuery::All { node_type: None }), vec!["c1", "h1"]);
        assert_eq!(index.in_container("body").len(), 2);

        index.on_delete(&comment("c1", "comment"), NodeKind::ContainerAnnotation);
        assert!(index.get_by_id("c1").is_none());
        assert_eq!(index.get(None).len(), 1);
    }
}
