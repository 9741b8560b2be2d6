//! # Docgraph Editor
//!
//! Transactional editing layer on top of the `docgraph-model` store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: nodes, schema, operations, indices   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document                            │
//! │  - Staging copy (TransactionDocument)       │
//! │  - Atomic DocumentChange commits            │
//! │  - Undo/redo by inversion                   │
//! │  - Event proxies and change listeners       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ views: containers, selections, observers    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Committed store is the source of truth**: indices are derived views
//! 2. **All-or-nothing**: a change applies completely or not at all
//! 3. **Changes are immutable**: undo applies an inverse, it never edits history
//! 4. **Staged writes are invisible**: the committed store only sees saved transactions
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use docgraph_editor::{ChangeInfo, Document, Selection};
//! use docgraph_model::{Node, NodeStore, NodeType, PropertyPath, Schema};
//! use serde_json::{json, Value};
//!
//! let schema = Schema::new("article", "1")
//!     .with_type("paragraph", NodeType::new(["text"]))
//!     .with_type("bold", NodeType::property_annotation());
//! let mut doc = Document::new(Arc::new(schema));
//!
//! let tx = doc.start_transaction(Value::Null).unwrap();
//! tx.create(Node::new("p1", "paragraph").with("text", "Hello")).unwrap();
//! tx.create(
//!     Node::new("a1", "bold")
//!         .with("path", json!(["p1", "text"]))
//!         .with("startOffset", 0)
//!         .with("endOffset", 2),
//! )
//! .unwrap();
//! doc.save_transaction(None, Value::Null, ChangeInfo::default()).unwrap();
//!
//! let hits = doc
//!     .get_annotations_for_selection(&Selection::property(["p1", "text"], 0, 5), &Default::default())
//!     .unwrap();
//! assert_eq!(hits, vec!["a1"]);
//!
//! doc.undo().unwrap();
//! assert!(doc.get(&PropertyPath::from(["p1", "text"])).is_none());
//! ```

mod change;
mod document;
mod errors;
mod event_proxy;
mod lifecycle;
mod selection;
mod transaction;
mod undo_stack;

pub use change::{ChangeInfo, DocumentChange};
pub use document::{AnnotationQuery, Document, DocumentOptions, TransactionListener};
pub use errors::{EditorError, EditorResult};
pub use event_proxy::{ChangeCallback, EventProxy, ListenerId, PathNotifier, PATH_PROXY};
pub use lifecycle::NodeLifecycle;
pub use selection::{Container, ContainerSelection, LinearContainer, PropertySelection, Selection};
pub use transaction::TransactionDocument;
pub use undo_stack::{UndoStack, DEFAULT_UNDO_LEVELS};
