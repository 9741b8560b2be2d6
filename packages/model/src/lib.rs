//! # Docgraph Model
//!
//! Storage layer of the document graph: typed nodes addressed by property
//! paths, the primitive operations that mutate them, and the secondary
//! indices maintained alongside.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ ObjectOperation: create / delete / set /    │
//! │                  update(diff)               │
//! └─────────────────────────────────────────────┘
//!                     ↓ apply
//! ┌─────────────────────────────────────────────┐
//! │ GraphStore: node map                        │
//! │  - validates before mutating                │
//! │  - returns the operation in recorded form   │
//! └─────────────────────────────────────────────┘
//!                     ↓ hooks, registration order
//! ┌─────────────────────────────────────────────┐
//! │ IndexRegistry                               │
//! │  - type                                     │
//! │  - annotations (property-scoped)            │
//! │  - container-annotations                    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use docgraph_model::{GraphStore, Node, NodeStore, NodeType, PropertyPath, Schema};
//!
//! let schema = Arc::new(
//!     Schema::new("article", "1").with_type("paragraph", NodeType::new(["text"])),
//! );
//! let mut store = GraphStore::with_default_indices(schema);
//!
//! let op = store.create(Node::new("p1", "paragraph").with("text", "hello")).unwrap();
//! let text = store.get(&PropertyPath::from(["p1", "text"]));
//! assert_eq!(text, Some(&serde_json::json!("hello")));
//!
//! store.apply(&op.invert().unwrap()).unwrap();
//! assert!(store.is_empty());
//! ```

pub mod diff;
pub mod error;
pub mod index;
pub mod node;
pub mod operation;
pub mod path;
pub mod schema;
pub mod snapshot;
pub mod store;

pub use diff::{Diff, Sequence};
pub use error::{GraphError, GraphResult};
pub use index::{
    AnnotationEntry, AnnotationIndex, ContainerAnchor, ContainerAnnotationEntry,
    ContainerAnnotationIndex, Index, IndexQuery, IndexRegistry, TypeIndex, ANNOTATION_INDEX,
    CONTAINER_ANNOTATION_INDEX, TYPE_INDEX,
};
pub use node::{Node, NodeId};
pub use operation::ObjectOperation;
pub use path::PropertyPath;
pub use schema::{NodeKind, NodeType, Schema};
pub use snapshot::Snapshot;
pub use store::{GraphStore, NodeStore};
