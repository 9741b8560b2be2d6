//! # Selections and Containers
//!
//! Selections are only inspected for what annotation lookups need: whether
//! they address a single property or a span across a container, and their
//! endpoints. Containers are owned by the view layer; the document only
//! keeps a registry of them and asks them whether two container spans
//! overlap.

use std::fmt;

use docgraph_model::{ContainerAnchor, NodeId, PropertyPath};
use serde::{Deserialize, Serialize};

/// Range within a single property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySelection {
    pub path: PropertyPath,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Range spanning several nodes of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSelection {
    pub container_id: String,
    pub start_path: PropertyPath,
    pub start_offset: usize,
    pub end_path: PropertyPath,
    pub end_offset: usize,
}

impl From<&ContainerAnchor> for ContainerSelection {
    fn from(anchor: &ContainerAnchor) -> Self {
        Self {
            container_id: anchor.container.clone(),
            start_path: anchor.start_path.clone(),
            start_offset: anchor.start_offset,
            end_path: anchor.end_path.clone(),
            end_offset: anchor.end_offset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    Null,
    Property(PropertySelection),
    Container(ContainerSelection),
}

impl Selection {
    /// Property selection; offsets are ordered so that start <= end
    pub fn property(path: impl Into<PropertyPath>, start: usize, end: usize) -> Self {
        Selection::Property(PropertySelection {
            path: path.into(),
            start_offset: start.min(end),
            end_offset: start.max(end),
        })
    }

    pub fn container(
        container_id: impl Into<String>,
        start: (PropertyPath, usize),
        end: (PropertyPath, usize),
    ) -> Self {
        Selection::Container(ContainerSelection {
            container_id: container_id.into(),
            start_path: start.0,
            start_offset: start.1,
            end_path: end.0,
            end_offset: end.1,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Selection::Null)
    }

    pub fn is_property_selection(&self) -> bool {
        matches!(self, Selection::Property(_))
    }

    pub fn is_container_selection(&self) -> bool {
        matches!(self, Selection::Container(_))
    }

    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            Selection::Property(sel) => Some(&sel.path),
            _ => None,
        }
    }

    pub fn start_offset(&self) -> Option<usize> {
        match self {
            Selection::Property(sel) => Some(sel.start_offset),
            Selection::Container(sel) => Some(sel.start_offset),
            Selection::Null => None,
        }
    }

    pub fn end_offset(&self) -> Option<usize> {
        match self {
            Selection::Property(sel) => Some(sel.end_offset),
            Selection::Container(sel) => Some(sel.end_offset),
            Selection::Null => None,
        }
    }
}

/// Linear document flow across several nodes
pub trait Container: fmt::Debug {
    fn id(&self) -> &str;

    /// Whether two spans of this container overlap
    fn overlaps(&self, a: &ContainerSelection, b: &ContainerSelection) -> bool;
}

/// Container over an ordered list of node ids
///
/// Positions compare by `(node position, offset)`; spans are half-open like
/// property ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearContainer {
    id: String,
    nodes: Vec<NodeId>,
}

impl LinearContainer {
    pub fn new<I, S>(id: impl Into<String>, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Self {
            id: id.into(),
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|id| id == node_id)
    }

    fn coordinate(&self, path: &PropertyPath, offset: usize) -> Option<(usize, usize)> {
        Some((self.position(path.node_id()?)?, offset))
    }

    fn span(&self, sel: &ContainerSelection) -> Option<((usize, usize), (usize, usize))> {
        if sel.container_id != self.id {
            return None;
        }
        let start = self.coordinate(&sel.start_path, sel.start_offset)?;
        let end = self.coordinate(&sel.end_path, sel.end_offset)?;
        Some((start.min(end), start.max(end)))
    }
}

impl Container for LinearContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn overlaps(&self, a: &ContainerSelection, b: &ContainerSelection) -> bool {
        match (self.span(a), self.span(b)) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && a_end > b_start,
            _ => false,
        }
    }
}
