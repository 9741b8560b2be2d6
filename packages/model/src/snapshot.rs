use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeId};
use crate::schema::Schema;

/// Serializable state of a document
///
/// `schema` is the `[name, version]` pair of the schema the nodes were
/// written against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema: (String, String),
    pub nodes: BTreeMap<NodeId, Node>,
}

impl Snapshot {
    pub fn new(schema: &Schema, nodes: BTreeMap<NodeId, Node>) -> Self {
        Self {
            schema: (schema.name.clone(), schema.version.clone()),
            nodes,
        }
    }

    pub fn empty(schema: &Schema) -> Self {
        Self::new(schema, BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_json_shape() {
        let schema = Schema::new("article", "1.0");
        let mut nodes = BTreeMap::new();
        nodes.insert("p1".to_string(), Node::new("p1", "paragraph").with("text", "hi"));

        let json = serde_json::to_value(Snapshot::new(&schema, nodes)).unwrap();
        assert_eq!(
            json,
            json!({
                "schema": ["article", "1.0"],
                "nodes": {"p1": {"id": "p1", "type": "paragraph", "text": "hi"}}
            })
        );
    }
}
