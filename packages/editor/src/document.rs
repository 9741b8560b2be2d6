//! # Document
//!
//! Orchestrates the committed store, its staging copy, the undo history
//! and change notification.
//!
//! ## Lifecycle
//!
//! ```text
//! start_transaction → create/delete/set/update → save_transaction
//!        ↓                      ↓                        ↓
//!   stage.begin         staging copy + log      DocumentChange → store
//!                                                        ↓
//!                                         undo stack, proxies, listeners
//! ```
//!
//! Outside a transaction each mutation is staged, committed and recorded
//! on its own, exactly as if it had been wrapped in a one-operation
//! transaction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docgraph_model::{
    AnnotationIndex, ContainerAnnotationIndex, Diff, GraphResult, GraphStore, Index, IndexQuery,
    Node, NodeId, NodeStore, ObjectOperation, PropertyPath, Schema, Snapshot, TypeIndex,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::change::{revert, ChangeInfo, DocumentChange};
use crate::errors::{EditorError, EditorResult};
use crate::event_proxy::{ChangeCallback, EventProxy, PathNotifier, PATH_PROXY};
use crate::lifecycle::NodeLifecycle;
use crate::selection::{Container, ContainerSelection, Selection};
use crate::transaction::TransactionDocument;
use crate::undo_stack::{UndoStack, DEFAULT_UNDO_LEVELS};

pub type TransactionListener = Box<dyn FnMut(&Value)>;

/// Construction options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Maximum undo depth (0 = unlimited)
    pub undo_levels: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            undo_levels: DEFAULT_UNDO_LEVELS,
        }
    }
}

/// Filters for [`Document::get_annotations_for_selection`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationQuery<'a> {
    pub node_type: Option<&'a str>,
    /// Registered container to resolve container selections against
    pub container: Option<&'a str>,
}

impl<'a> AnnotationQuery<'a> {
    pub fn of_type(node_type: &'a str) -> Self {
        Self {
            node_type: Some(node_type),
            container: None,
        }
    }

    pub fn in_container(mut self, container: &'a str) -> Self {
        self.container = Some(container);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Idle,
    Transacting,
}

/// Transactional, versioned document graph
pub struct Document {
    schema: Arc<Schema>,
    options: DocumentOptions,
    data: GraphStore,
    stage: TransactionDocument,
    state: TransactionState,
    history: UndoStack,
    containers: BTreeMap<String, Box<dyn Container>>,
    event_proxies: Vec<Box<dyn EventProxy>>,
    change_listeners: Vec<ChangeCallback>,
    transaction_listeners: Vec<TransactionListener>,
    lifecycle_hooks: Vec<Box<dyn NodeLifecycle>>,
}

impl Document {
    /// Empty document
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_options(schema, DocumentOptions::default())
    }

    pub fn with_options(schema: Arc<Schema>, options: DocumentOptions) -> Self {
        let data = GraphStore::with_default_indices(Arc::clone(&schema));
        let stage = GraphStore::with_default_indices(Arc::clone(&schema));
        Self::assemble(schema, options, data, stage)
    }

    /// Document seeded from a snapshot
    pub fn from_snapshot(schema: Arc<Schema>, snapshot: &Snapshot) -> EditorResult<Self> {
        Self::from_snapshot_with_options(schema, snapshot, DocumentOptions::default())
    }

    pub fn from_snapshot_with_options(
        schema: Arc<Schema>,
        snapshot: &Snapshot,
        options: DocumentOptions,
    ) -> EditorResult<Self> {
        let data = GraphStore::from_snapshot(Arc::clone(&schema), snapshot)?;
        let stage = GraphStore::from_snapshot(Arc::clone(&schema), snapshot)?;
        info!("Loaded document with {} nodes", data.len());
        Ok(Self::assemble(schema, options, data, stage))
    }

    /// Empty document with the same schema and options
    pub fn new_instance(&self) -> Self {
        Self::with_options(Arc::clone(&self.schema), self.options)
    }

    fn assemble(
        schema: Arc<Schema>,
        options: DocumentOptions,
        data: GraphStore,
        stage: GraphStore,
    ) -> Self {
        Self {
            schema,
            options,
            data,
            stage: TransactionDocument::new(stage),
            state: TransactionState::Idle,
            history: UndoStack::with_max_levels(options.undo_levels),
            containers: BTreeMap::new(),
            event_proxies: vec![Box::new(PathNotifier::new())],
            change_listeners: Vec::new(),
            transaction_listeners: Vec::new(),
            lifecycle_hooks: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Committed store
    pub fn data(&self) -> &GraphStore {
        &self.data
    }

    pub fn get(&self, path: &PropertyPath) -> Option<&Value> {
        self.data.get(path)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.data.get_node(id)
    }

    pub fn get_nodes(&self) -> &BTreeMap<NodeId, Node> {
        self.data.nodes()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains(id)
    }

    /// Serializable snapshot of the committed state
    pub fn to_json(&self) -> Snapshot {
        self.data.to_snapshot()
    }

    // Containers

    pub fn add_container(&mut self, container: Box<dyn Container>) -> EditorResult<()> {
        let id = container.id().to_string();
        if self.containers.contains_key(&id) {
            return Err(EditorError::DuplicateContainer(id));
        }
        self.containers.insert(id, container);
        Ok(())
    }

    pub fn get_container(&self, id: &str) -> Option<&dyn Container> {
        self.containers.get(id).map(|container| container.as_ref())
    }

    pub fn remove_container(&mut self, id: &str) -> Option<Box<dyn Container>> {
        self.containers.remove(id)
    }

    // Indices

    /// Registers an index on both the committed store and the staging copy
    pub fn add_index<I: Index + Clone>(&mut self, name: &str, index: I) -> EditorResult<()> {
        self.data.add_index(name, Box::new(index.clone()))?;
        self.stage.store_mut().add_index(name, Box::new(index))?;
        Ok(())
    }

    pub fn get_index(&self, name: &str) -> Option<&dyn Index> {
        self.data.indices().get(name)
    }

    pub fn index<T: Index>(&self, name: &str) -> Option<&T> {
        self.data.index(name)
    }

    pub fn query_index(&self, name: &str, query: &IndexQuery<'_>) -> Option<Vec<NodeId>> {
        self.data.query_index(name, query)
    }

    pub fn type_index(&self) -> Option<&TypeIndex> {
        self.data.type_index()
    }

    pub fn annotation_index(&self) -> Option<&AnnotationIndex> {
        self.data.annotation_index()
    }

    pub fn container_annotation_index(&self) -> Option<&ContainerAnnotationIndex> {
        self.data.container_annotation_index()
    }

    // Notification

    /// Appends a proxy; proxies are notified in registration order
    pub fn add_event_proxy(&mut self, proxy: Box<dyn EventProxy>) {
        self.event_proxies.push(proxy);
    }

    pub fn get_event_proxy(&mut self, name: &str) -> Option<&mut (dyn EventProxy + 'static)> {
        self.event_proxies
            .iter_mut()
            .find(|proxy| proxy.name() == name)
            .map(|proxy| proxy.as_mut())
    }

    /// The built-in path-scoped proxy
    pub fn path_notifier(&mut self) -> Option<&mut PathNotifier> {
        self.get_event_proxy(PATH_PROXY)?
            .as_any_mut()
            .downcast_mut::<PathNotifier>()
    }

    /// Listener for every applied change, called after the proxies
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&DocumentChange, &ChangeInfo) + 'static,
    {
        self.change_listeners.push(Box::new(listener));
    }

    /// Listener called with the before state whenever a transaction starts
    pub fn on_transaction_started<F>(&mut self, listener: F)
    where
        F: FnMut(&Value) + 'static,
    {
        self.transaction_listeners.push(Box::new(listener));
    }

    pub fn add_lifecycle_hook(&mut self, hook: Box<dyn NodeLifecycle>) {
        self.lifecycle_hooks.push(hook);
    }

    // Transactions

    pub fn is_transacting(&self) -> bool {
        self.state == TransactionState::Transacting
    }

    /// Opens a transaction and hands out the staging document to mutate
    pub fn start_transaction(&mut self, before: Value) -> EditorResult<&mut TransactionDocument> {
        if self.is_transacting() {
            return Err(EditorError::NestedTransaction);
        }
        self.state = TransactionState::Transacting;
        self.stage.begin(before);
        for listener in &mut self.transaction_listeners {
            listener(self.stage.before());
        }
        debug!("Transaction started");
        Ok(&mut self.stage)
    }

    /// The staging document of the active transaction
    pub fn transaction(&mut self) -> Option<&mut TransactionDocument> {
        if self.is_transacting() {
            Some(&mut self.stage)
        } else {
            None
        }
    }

    /// Commits the staged operations as one change.
    ///
    /// `before` defaults to the state given to `start_transaction`. A
    /// transaction without operations is still recorded, so it clears the
    /// redo history like any other save.
    #[instrument(skip_all)]
    pub fn save_transaction(
        &mut self,
        before: Option<Value>,
        after: Value,
        info: ChangeInfo,
    ) -> EditorResult<()> {
        if !self.is_transacting() {
            return Err(EditorError::NotInTransaction);
        }
        self.state = TransactionState::Idle;
        let staged_before = self.stage.take_before();
        let ops = self.stage.get_operations();
        let change = DocumentChange::new(ops, before.unwrap_or(staged_before), after);
        info!(ops = change.len(), "Saving transaction");
        self.commit(change, info)
    }

    /// Discards the staged operations; the committed store is untouched
    pub fn cancel_transaction(&mut self) -> EditorResult<()> {
        if !self.is_transacting() {
            return Err(EditorError::NotInTransaction);
        }
        self.state = TransactionState::Idle;
        self.stage.rollback();
        debug!("Transaction cancelled");
        Ok(())
    }

    pub fn create(&mut self, node: Node) -> EditorResult<()> {
        self.route(|stage| stage.create(node))
    }

    pub fn delete(&mut self, id: &str) -> EditorResult<()> {
        self.route(|stage| stage.delete(id))
    }

    pub fn set(&mut self, path: &PropertyPath, value: Value) -> EditorResult<()> {
        self.route(|stage| stage.set(path, value))
    }

    pub fn update(&mut self, path: &PropertyPath, diff: Diff) -> EditorResult<()> {
        self.route(|stage| stage.update(path, diff))
    }

    /// Stages always; commits right away when no transaction is open
    fn route<F>(&mut self, mutate: F) -> EditorResult<()>
    where
        F: FnOnce(&mut TransactionDocument) -> GraphResult<ObjectOperation>,
    {
        match self.state {
            TransactionState::Transacting => {
                mutate(&mut self.stage)?;
                Ok(())
            }
            TransactionState::Idle => {
                self.stage.begin(Value::Null);
                mutate(&mut self.stage)?;
                let ops = self.stage.get_operations();
                self.commit(
                    DocumentChange::new(ops, Value::Null, Value::Null),
                    ChangeInfo::default(),
                )
            }
        }
    }

    // History

    /// Reverts the latest change. Returns `false` when there is nothing to undo.
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> EditorResult<bool> {
        if self.is_transacting() {
            return Err(EditorError::ReplayDuringTransaction);
        }
        let Some(change) = self.history.take_undo() else {
            warn!("No change can be undone.");
            return Ok(false);
        };
        match self.replay(&change) {
            Ok(inverted) => {
                info!(ops = inverted.len(), "Undo");
                self.history.push_undone(inverted.clone());
                self.notify(&inverted, &ChangeInfo::replay());
                Ok(true)
            }
            Err(err) => {
                self.history.push_done(change);
                Err(err)
            }
        }
    }

    /// Re-applies the latest undone change. Returns `false` when there is nothing to redo.
    #[instrument(skip(self))]
    pub fn redo(&mut self) -> EditorResult<bool> {
        if self.is_transacting() {
            return Err(EditorError::ReplayDuringTransaction);
        }
        let Some(change) = self.history.take_redo() else {
            warn!("No change can be redone.");
            return Ok(false);
        };
        match self.replay(&change) {
            Ok(inverted) => {
                info!(ops = inverted.len(), "Redo");
                self.history.push_done(inverted.clone());
                self.notify(&inverted, &ChangeInfo::replay());
                Ok(true)
            }
            Err(err) => {
                self.history.push_undone(change);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_levels(&self) -> usize {
        self.history.undo_levels()
    }

    pub fn redo_levels(&self) -> usize {
        self.history.redo_levels()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // Annotation queries

    /// Annotations overlapping a selection
    ///
    /// Property selections are answered from the annotation index.
    /// Container selections need `query.container`, a registered container
    /// that decides overlap.
    pub fn get_annotations_for_selection(
        &self,
        selection: &Selection,
        query: &AnnotationQuery<'_>,
    ) -> EditorResult<Vec<NodeId>> {
        match selection {
            Selection::Container(sel) => {
                let id = query.container.ok_or(EditorError::ContainerRequired)?;
                let container = self
                    .get_container(id)
                    .ok_or_else(|| EditorError::ContainerNotFound(id.to_string()))?;
                Ok(self.get_container_annotations_for_selection(sel, container, query.node_type))
            }
            Selection::Property(sel) => {
                let Some(index) = self.data.annotation_index() else {
                    return Ok(Vec::new());
                };
                Ok(index
                    .get(&sel.path, sel.start_offset, sel.end_offset)
                    .into_iter()
                    .filter(|entry| query.node_type.map_or(true, |t| entry.node_type == t))
                    .map(|entry| entry.id.clone())
                    .collect())
            }
            Selection::Null => Ok(Vec::new()),
        }
    }

    /// Container annotations of `container` overlapping `selection`
    pub fn get_container_annotations_for_selection(
        &self,
        selection: &ContainerSelection,
        container: &dyn Container,
        node_type: Option<&str>,
    ) -> Vec<NodeId> {
        let Some(index) = self.data.container_annotation_index() else {
            return Vec::new();
        };
        index
            .get(node_type)
            .into_iter()
            .filter(|entry| entry.anchor.container == container.id())
            .filter(|entry| container.overlaps(selection, &ContainerSelection::from(&entry.anchor)))
            .map(|entry| entry.id.clone())
            .collect()
    }

    // Internals

    fn commit(&mut self, change: DocumentChange, info: ChangeInfo) -> EditorResult<()> {
        if let Err(err) = self.apply_to_data(&change) {
            revert(self.stage.store_mut(), change.ops());
            return Err(err);
        }
        self.history.record(change.clone());
        self.notify(&change, &info);
        Ok(())
    }

    /// Inverts `change` and applies the result to the staging copy and the store
    fn replay(&mut self, change: &DocumentChange) -> EditorResult<DocumentChange> {
        let inverted = change.invert()?;
        inverted.apply_to(self.stage.store_mut())?;
        if let Err(err) = self.apply_to_data(&inverted) {
            revert(self.stage.store_mut(), inverted.ops());
            return Err(err);
        }
        Ok(inverted)
    }

    fn apply_to_data(&mut self, change: &DocumentChange) -> EditorResult<()> {
        let applied = change.apply_to(&mut self.data)?;
        for op in &applied {
            match op {
                ObjectOperation::Create { node } => {
                    for hook in &mut self.lifecycle_hooks {
                        hook.attach(node);
                    }
                }
                ObjectOperation::Delete { node: Some(node), .. } => {
                    for hook in &mut self.lifecycle_hooks {
                        hook.detach(node);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn notify(&mut self, change: &DocumentChange, info: &ChangeInfo) {
        for proxy in &mut self.event_proxies {
            proxy.on_document_changed(change, info);
        }
        for listener in &mut self.change_listeners {
            listener(change, info);
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("schema", &self.schema.qualified_name())
            .field("nodes", &self.data.len())
            .field("state", &self.state)
            .field("history", &self.history)
            .field("containers", &self.containers.keys().collect::<Vec<_>>())
            .finish()
    }
}
