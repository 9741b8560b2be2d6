use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type NodeId = String;

/// A typed record in the document graph
///
/// Properties are stored as JSON values. A `null` value is never stored:
/// assigning `null` removes the property, so "absent" and "null" are the
/// same state everywhere in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_offset(&self, name: &str) -> Option<usize> {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Assigns a property and returns its previous value (`Null` when absent)
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Value {
        let name = name.into();
        let previous = if value.is_null() {
            self.properties.remove(&name)
        } else {
            self.properties.insert(name, value)
        };
        previous.unwrap_or(Value::Null)
    }

    /// Drops `null` properties so the node is in canonical form
    pub fn normalized(mut self) -> Self {
        self.properties.retain(|_, value| !value.is_null());
        self
    }
}
