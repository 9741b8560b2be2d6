use std::any::Any;
use std::collections::HashMap;

use tracing::warn;

use crate::index::{Index, IndexQuery};
use crate::node::{Node, NodeId};
use crate::path::PropertyPath;
use crate::schema::{NodeKind, ANNOTATION_PROPERTIES};

/// One property-scoped annotation as seen by the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEntry {
    pub id: NodeId,
    pub node_type: String,
    pub start: usize,
    pub end: usize,
}

impl AnnotationEntry {
    /// Half-open overlap with `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && self.end > start
    }
}

/// Annotations grouped by the property they are anchored to
///
/// Each per-path list is kept sorted by `(start, id)`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    by_path: HashMap<PropertyPath, Vec<AnnotationEntry>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `path`/`startOffset`/`endOffset` anchor of an annotation node
    pub fn anchor(node: &Node) -> Option<(PropertyPath, usize, usize)> {
        let path: PropertyPath = node
            .get("path")
            .cloned()
            .and_then(|value| serde_json::from_value::<PropertyPath>(value).ok())?;
        let start = node.get_offset("startOffset")?;
        let end = node.get_offset("endOffset")?;
        Some((path, start, end))
    }

    /// Annotations on `path` overlapping `[start, end)`, in start order
    pub fn get(&self, path: &PropertyPath, start: usize, end: usize) -> Vec<&AnnotationEntry> {
        let Some(entries) = self.by_path.get(path) else {
            return Vec::new();
        };
        entries
            .iter()
            .take_while(|entry| entry.start < end)
            .filter(|entry| entry.overlaps(start, end))
            .collect()
    }

    /// Every annotation anchored to `path`, in start order
    pub fn entries(&self, path: &PropertyPath) -> &[AnnotationEntry] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Anchored paths, sorted
    pub fn paths(&self) -> Vec<&PropertyPath> {
        let mut paths: Vec<&PropertyPath> = self.by_path.keys().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.by_path.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    fn insert(&mut self, path: PropertyPath, entry: AnnotationEntry) {
        let entries = self.by_path.entry(path).or_default();
        let at = entries.partition_point(|e| (e.start, &e.id) < (entry.start, &entry.id));
        entries.insert(at, entry);
    }

    fn remove(&mut self, path: &PropertyPath, id: &str) {
        if let Some(entries) = self.by_path.get_mut(path) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                self.by_path.remove(path);
            }
        }
    }
}

impl Index for AnnotationIndex {
    fn select(&self, _node: &Node, kind: NodeKind) -> bool {
        kind == NodeKind::PropertyAnnotation
    }

    fn on_create(&mut self, node: &Node, _kind: NodeKind) {
        match Self::anchor(node) {
            Some((path, start, end)) => self.insert(
                path,
                AnnotationEntry {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    start,
                    end,
                },
            ),
            None => warn!("Annotation '{}' has no valid anchor, not indexed", node.id),
        }
    }

    fn on_delete(&mut self, node: &Node, _kind: NodeKind) {
        if let Some((path, _, _)) = Self::anchor(node) {
            self.remove(&path, &node.id);
        }
    }

    fn on_property_change(&mut self, before: &Node, after: &Node, path: &PropertyPath, kind: NodeKind) {
        let touches_anchor = path
            .property_name()
            .is_some_and(|property| ANNOTATION_PROPERTIES.contains(&property));
        if touches_anchor {
            self.on_delete(before, kind);
            self.on_create(after, kind);
        }
    }

    fn query(&self, query: &IndexQuery<'_>) -> Vec<NodeId> {
        match query {
            IndexQuery::Range { path, start, end } => self
                .get(path, *start, *end)
                .into_iter()
                .map(|entry| entry.id.clone())
                .collect(),
            IndexQuery::Type(node_type) | IndexQuery::All { node_type: Some(node_type) } => {
                let mut ids: Vec<NodeId> = self
                    .by_path
                    .values()
                    .flatten()
                    .filter(|entry| entry.node_type == *node_type)
                    .map(|entry| entry.id.clone())
                    .collect();
                ids.sort();
                ids
            }
            IndexQuery::All { node_type: None } => {
                let mut ids: Vec<NodeId> = self
                    .by_path
                    .values()
                    .flatten()
                    .map(|entry| entry.id.clone())
                    .collect();
                ids.sort();
                ids
            }
        }
    }

    fn reset(&mut self) {
        self.by_path.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_value(path: &PropertyPath) -> serde_json::Value {
        serde_json::to_value(path).unwrap()
    }

    fn bold(id: &str, path: &PropertyPath, start: usize, end: usize) -> Node {
        Node::new(id, "bold")
            .with("path", path_value(path))
            .with("startOffset", start)
            .with("endOffset", end)
    }

    fn ids(entries: Vec<&AnnotationEntry>) -> Vec<&str> {
        entries.into_iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn test_half_open_overlap() {
        let path = PropertyPath::from(["p", "text"]);
        let mut index = AnnotationIndex::new();
        index.on_create(&bold("a", &path, 3, 7), NodeKind::PropertyAnnotation);

        assert!(ids(index.get(&path, 0, 3)).is_empty());
        assert_eq!(ids(index.get(&path, 3, 4)), vec!["a"]);
        assert_eq!(ids(index.get(&path, 6, 10)), vec!["a"]);
        assert!(ids(index.get(&path, 7, 9)).is_empty());
    }

    #[test]
    fn test_entries_stay_sorted_by_start() {
        let path = PropertyPath::from(["p", "text"]);
        let mut index = AnnotationIndex::new();
        for (id, start) in [("c", 8), ("a", 0), ("b", 4), ("a2", 4)] {
            index.on_create(&bold(id, &path, start, start + 2), NodeKind::PropertyAnnotation);
        }

        let starts: Vec<(usize, &str)> = index
            .entries(&path)
            .iter()
            .map(|entry| (entry.start, entry.id.as_str()))
            .collect();
        assert_eq!(starts, vec![(0, "a"), (4, "a2"), (4, "b"), (8, "c")]);
        assert_eq!(ids(index.get(&path, 3, 9)), vec!["a2", "b", "c"]);
    }

    #[test]
    fn test_delete_and_anchor_change() {
        let p1 = PropertyPath::from(["p1", "text"]);
        let p2 = PropertyPath::from(["p2", "text"]);
        let mut index = AnnotationIndex::new();
        let before = bold("a", &p1, 0, 2);
        index.on_create(&before, NodeKind::PropertyAnnotation);

        let after = before.clone().with("path", path_value(&p2));
        index.on_property_change(
            &before,
            &after,
            &PropertyPath::from(["a", "path"]),
            NodeKind::PropertyAnnotation,
        );
        assert!(index.entries(&p1).is_empty());
        assert_eq!(index.entries(&p2).len(), 1);

        index.on_delete(&after, NodeKind::PropertyAnnotation);
        assert!(index.is_empty());
    }

    #[test]
    fn test_selects_only_property_annotations() {
        let index = AnnotationIndex::new();
        let node = Node::new("p1", "paragraph");
        assert!(!index.select(&node, NodeKind::Node));
        assert!(!index.select(&node, NodeKind::ContainerAnnotation));
        assert!(index.select(&node, NodeKind::PropertyAnnotation));
    }
}
