//! # Schema
//!
//! The schema names the node types a document may contain and classifies
//! each of them for indexing. It does not validate business rules: the
//! store only asks it whether a type exists, which properties it accepts,
//! and whether its nodes are annotations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Property names anchoring a property-scoped annotation
pub const ANNOTATION_PROPERTIES: [&str; 3] = ["path", "startOffset", "endOffset"];

/// Property names anchoring a container-scoped annotation
pub const CONTAINER_ANNOTATION_PROPERTIES: [&str; 5] =
    ["container", "startPath", "startOffset", "endPath", "endOffset"];

/// How a node participates in the annotation indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    #[default]
    Node,
    PropertyAnnotation,
    ContainerAnnotation,
}

/// Declaration of a single node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeType {
    /// Recognised property names (empty = any property accepted)
    #[serde(default)]
    pub properties: Vec<String>,

    #[serde(default)]
    pub kind: NodeKind,
}

impl NodeType {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            kind: NodeKind::Node,
        }
    }

    pub fn property_annotation() -> Self {
        Self {
            properties: Vec::new(),
            kind: NodeKind::PropertyAnnotation,
        }
    }

    pub fn container_annotation() -> Self {
        Self {
            properties: Vec::new(),
            kind: NodeKind::ContainerAnnotation,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    pub fn accepts(&self, property: &str) -> bool {
        if self.properties.is_empty() || self.properties.iter().any(|p| p == property) {
            return true;
        }
        match self.kind {
            NodeKind::Node => false,
            NodeKind::PropertyAnnotation => ANNOTATION_PROPERTIES.contains(&property),
            NodeKind::ContainerAnnotation => CONTAINER_ANNOTATION_PROPERTIES.contains(&property),
        }
    }
}

/// Named, versioned set of node types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub types: BTreeMap<String, NodeType>,
}

impl Schema {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            types: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, name: impl Into<String>, node_type: NodeType) -> Self {
        self.types.insert(name.into(), node_type);
        self
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Index classification for a type (unknown types are plain nodes)
    pub fn kind_of(&self, name: &str) -> NodeKind {
        self.node_type(name).map(|t| t.kind).unwrap_or_default()
    }

    /// `name@version`, as used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}
