//! Integration tests for the document lifecycle

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use docgraph_editor::{
    ChangeInfo, Document, DocumentChange, EditorError, NodeLifecycle, Selection,
};
use docgraph_model::{Diff, GraphError, Node, NodeStore, NodeType, PropertyPath, Schema};
use serde_json::{json, Value};

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new("article", "1")
            .with_type("paragraph", NodeType::new(["text"]))
            .with_type("heading", NodeType::new(["text", "level"]))
            .with_type("bold", NodeType::property_annotation()),
    )
}

fn text(node: &str) -> PropertyPath {
    PropertyPath::from([node, "text"])
}

fn bold(id: &str, node: &str, start: usize, end: usize) -> Node {
    Node::new(id, "bold")
        .with("path", json!([node, "text"]))
        .with("startOffset", start)
        .with("endOffset", end)
}

#[test]
fn test_transaction_commits_paragraph_and_annotation() -> anyhow::Result<()> {
    let mut doc = Document::new(schema());

    let tx = doc.start_transaction(json!({"cursor": 0}))?;
    tx.create(Node::new("p1", "paragraph").with("text", "Hello"))?;
    tx.create(bold("a1", "p1", 0, 2))?;
    doc.save_transaction(None, json!({"cursor": 5}), ChangeInfo::default())?;

    assert_eq!(doc.get(&text("p1")), Some(&json!("Hello")));
    let hits =
        doc.get_annotations_for_selection(&Selection::property(["p1", "text"], 0, 5), &Default::default())?;
    assert_eq!(hits, vec!["a1"]);

    assert!(doc.undo()?);
    assert!(!doc.contains("p1"));
    assert!(!doc.contains("a1"));
    assert!(doc.annotation_index().unwrap().is_empty());

    assert!(doc.redo()?);
    assert_eq!(doc.get(&text("p1")), Some(&json!("Hello")));
    let hits =
        doc.get_annotations_for_selection(&Selection::property(["p1", "text"], 0, 5), &Default::default())?;
    assert_eq!(hits, vec!["a1"]);
    Ok(())
}

#[test]
fn test_immediate_mutations_match_transactions() -> anyhow::Result<()> {
    let build = |doc: &mut Document| -> Result<(), EditorError> {
        doc.create(Node::new("p1", "paragraph").with("text", "abc"))?;
        doc.update(&text("p1"), Diff::insert_text(3, "def"))?;
        doc.set(&text("p1"), json!("xyz"))
    };

    let mut immediate = Document::new(schema());
    build(&mut immediate)?;

    let mut staged = Document::new(schema());
    staged.start_transaction(Value::Null)?;
    build(&mut staged)?;
    staged.save_transaction(None, Value::Null, ChangeInfo::default())?;

    assert_eq!(immediate.to_json(), staged.to_json());
    // Each immediate mutation is its own undoable change
    assert_eq!(immediate.undo_levels(), 3);
    assert_eq!(staged.undo_levels(), 1);
    Ok(())
}

/// Document with a committed paragraph, recording every change it notifies
fn recording_document() -> (Document, Rc<RefCell<Vec<(DocumentChange, ChangeInfo)>>>) {
    let mut doc = Document::new(schema());
    doc.create(Node::new("p1", "paragraph").with("text", "Hello"))
        .unwrap();
    let seen: Rc<RefCell<Vec<(DocumentChange, ChangeInfo)>>> = Rc::default();
    let log = Rc::clone(&seen);
    doc.on_change(move |change, info| log.borrow_mut().push((change.clone(), info.clone())));
    (doc, seen)
}

#[test]
fn test_single_edit_matches_one_edit_transaction() -> anyhow::Result<()> {
    let (mut immediate, immediate_seen) = recording_document();
    immediate.create(bold("a1", "p1", 1, 4))?;

    let (mut staged, staged_seen) = recording_document();
    staged.start_transaction(Value::Null)?;
    staged.create(bold("a1", "p1", 1, 4))?;
    staged.save_transaction(None, Value::Null, ChangeInfo::default())?;

    assert_eq!(immediate.to_json(), staged.to_json());
    assert_eq!(
        immediate.type_index().unwrap().get("bold"),
        staged.type_index().unwrap().get("bold")
    );
    let selection = Selection::property(["p1", "text"], 0, 5);
    let immediate_hits = immediate.get_annotations_for_selection(&selection, &Default::default())?;
    assert_eq!(immediate_hits, vec!["a1"]);
    assert_eq!(
        immediate_hits,
        staged.get_annotations_for_selection(&selection, &Default::default())?
    );
    let immediate_annotations = immediate.annotation_index().unwrap();
    let staged_annotations = staged.annotation_index().unwrap();
    assert_eq!(immediate_annotations.get(&text("p1"), 0, 5).len(), 1);
    assert_eq!(
        immediate_annotations.get(&text("p1"), 0, 5),
        staged_annotations.get(&text("p1"), 0, 5)
    );
    assert_eq!(
        immediate_annotations.entries(&text("p1")),
        staged_annotations.entries(&text("p1"))
    );

    let immediate_seen = immediate_seen.borrow();
    let staged_seen = staged_seen.borrow();
    assert_eq!(immediate_seen.len(), 1);
    assert_eq!(staged_seen.len(), 1);
    let (immediate_change, immediate_info) = &immediate_seen[0];
    let (staged_change, staged_info) = &staged_seen[0];
    assert_eq!(immediate_change.ops(), staged_change.ops());
    assert_eq!(immediate_change.before(), staged_change.before());
    assert_eq!(immediate_change.after(), staged_change.after());
    assert_eq!(immediate_info.replay, staged_info.replay);
    assert_eq!(immediate_info, staged_info);
    assert_eq!(immediate.undo_levels(), staged.undo_levels());
    Ok(())
}

#[test]
fn test_failed_save_leaves_store_untouched() -> anyhow::Result<()> {
    let mut doc = Document::new(schema());
    doc.create(Node::new("p1", "paragraph").with("text", "abc"))?;
    let before = doc.to_json();

    let tx = doc.start_transaction(Value::Null)?;
    tx.set(&text("p1"), json!("changed"))?;
    tx.delete("p1")?;
    let err = tx
        .update(&text("p1"), Diff::insert_text(0, "x"))
        .unwrap_err();
    assert_eq!(err, GraphError::NotFound("p1".into()));
    doc.cancel_transaction()?;

    assert_eq!(doc.to_json(), before);
    assert_eq!(doc.undo_levels(), 1);
    Ok(())
}

#[test]
fn test_listener_receives_saved_change() -> anyhow::Result<()> {
    let seen: Rc<RefCell<Vec<(DocumentChange, ChangeInfo)>>> = Rc::default();
    let mut doc = Document::new(schema());
    let log = Rc::clone(&seen);
    doc.on_change(move |change, info| log.borrow_mut().push((change.clone(), info.clone())));

    doc.start_transaction(json!("sel-before"))?;
    doc.create(Node::new("p1", "paragraph"))?;
    doc.save_transaction(None, json!("sel-after"), ChangeInfo::with_data(json!({"source": "test"})))?;
    doc.undo()?;

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);

    let (saved, info) = &seen[0];
    assert_eq!(saved.before(), &json!("sel-before"));
    assert_eq!(saved.after(), &json!("sel-after"));
    assert_eq!(saved.created(), vec!["p1"]);
    assert!(!info.replay);
    assert_eq!(info.data, json!({"source": "test"}));

    let (undone, info) = &seen[1];
    assert_eq!(undone.deleted(), vec!["p1"]);
    assert_eq!(undone.before(), &json!("sel-after"));
    assert!(info.replay);
    Ok(())
}

#[test]
fn test_explicit_before_state_overrides_start_state() -> anyhow::Result<()> {
    let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    let mut doc = Document::new(schema());
    let log = Rc::clone(&seen);
    doc.on_change(move |change, _| log.borrow_mut().push(change.before().clone()));

    doc.start_transaction(json!(1))?;
    doc.create(Node::new("p1", "paragraph"))?;
    doc.save_transaction(Some(json!(2)), Value::Null, ChangeInfo::default())?;

    assert_eq!(*seen.borrow(), vec![json!(2)]);
    Ok(())
}

#[test]
fn test_transaction_started_listener() -> anyhow::Result<()> {
    let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    let mut doc = Document::new(schema());
    let log = Rc::clone(&seen);
    doc.on_transaction_started(move |before| log.borrow_mut().push(before.clone()));

    doc.start_transaction(json!("a"))?;
    doc.cancel_transaction()?;
    // Immediate mutations do not open a visible transaction
    doc.create(Node::new("p1", "paragraph"))?;

    assert_eq!(*seen.borrow(), vec![json!("a")]);
    Ok(())
}

#[test]
fn test_path_notifier_runs_before_listeners() -> anyhow::Result<()> {
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let mut doc = Document::new(schema());
    doc.create(Node::new("p1", "paragraph").with("text", "a"))?;
    doc.create(Node::new("p2", "paragraph").with("text", "b"))?;

    let log = Rc::clone(&order);
    doc.on_change(move |_, _| log.borrow_mut().push("listener"));
    let log = Rc::clone(&order);
    let id = doc
        .path_notifier()
        .unwrap()
        .connect(text("p1"), move |_, _| log.borrow_mut().push("p1.text"));

    doc.set(&text("p2"), json!("c"))?;
    assert_eq!(*order.borrow(), vec!["listener"]);

    doc.update(&text("p1"), Diff::insert_text(1, "z"))?;
    assert_eq!(*order.borrow(), vec!["listener", "p1.text", "listener"]);

    assert!(doc.path_notifier().unwrap().disconnect(id));
    doc.set(&text("p1"), json!("q"))?;
    assert_eq!(order.borrow().len(), 4);
    Ok(())
}

#[derive(Debug, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<String>>>,
}

impl NodeLifecycle for Recorder {
    fn attach(&mut self, node: &Node) {
        self.events.borrow_mut().push(format!("attach {}", node.id));
    }

    fn detach(&mut self, node: &Node) {
        self.events.borrow_mut().push(format!("detach {}", node.id));
    }
}

#[test]
fn test_lifecycle_hooks_follow_committed_store() -> anyhow::Result<()> {
    let events: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut doc = Document::new(schema());
    doc.add_lifecycle_hook(Box::new(Recorder {
        events: Rc::clone(&events),
    }));

    let tx = doc.start_transaction(Value::Null)?;
    tx.create(Node::new("p1", "paragraph"))?;
    assert!(events.borrow().is_empty());
    doc.save_transaction(None, Value::Null, ChangeInfo::default())?;

    doc.delete("p1")?;
    doc.undo()?;

    assert_eq!(*events.borrow(), vec!["attach p1", "detach p1", "attach p1"]);
    Ok(())
}

#[test]
fn test_schema_violations_are_reported() {
    let mut doc = Document::new(schema());
    assert_eq!(
        doc.create(Node::new("x", "table")),
        Err(EditorError::Graph(GraphError::UnknownNodeType("table".into())))
    );
    doc.create(Node::new("p1", "paragraph")).unwrap();
    assert_eq!(
        doc.create(Node::new("p1", "paragraph")),
        Err(EditorError::Graph(GraphError::DuplicateId("p1".into())))
    );
    assert!(matches!(
        doc.set(&PropertyPath::from(["p1", "type"]), json!("heading")),
        Err(EditorError::Graph(GraphError::InvalidPath { .. }))
    ));
    assert_eq!(doc.undo_levels(), 1);
}

#[test]
fn test_snapshot_roundtrip_through_json() -> anyhow::Result<()> {
    let mut doc = Document::new(schema());
    doc.create(Node::new("h1", "heading").with("text", "Title").with("level", 1))?;
    doc.create(Node::new("p1", "paragraph").with("text", "Body"))?;
    doc.create(bold("a1", "p1", 1, 3))?;

    let json = serde_json::to_string(&doc.to_json())?;
    let restored = Document::from_snapshot(schema(), &serde_json::from_str(&json)?)?;

    assert_eq!(restored.get_nodes(), doc.get_nodes());
    assert!(!restored.can_undo());
    assert_eq!(restored.type_index().unwrap().get("heading"), vec!["h1"]);
    assert_eq!(
        restored.get_annotations_for_selection(&Selection::property(["p1", "text"], 0, 2), &Default::default())?,
        vec!["a1"]
    );

    let fresh = restored.new_instance();
    assert!(fresh.get_nodes().is_empty());
    assert_eq!(fresh.schema().qualified_name(), "article@1");
    Ok(())
}

#[test]
fn test_snapshot_schema_mismatch() {
    let mut doc = Document::new(schema());
    doc.create(Node::new("p1", "paragraph")).unwrap();
    let snapshot = doc.to_json();

    let other = Arc::new(Schema::new("article", "2").with_type("paragraph", NodeType::new(["text"])));
    assert!(matches!(
        Document::from_snapshot(other, &snapshot),
        Err(EditorError::Graph(GraphError::SchemaMismatch { .. }))
    ));
}
