//! # Change Event Proxies
//!
//! Proxies receive every applied change before the generic change
//! listeners and re-notify only the observers interested in it. Observers
//! of a single property register with [`PathNotifier`] instead of listening
//! to every change of the document.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use docgraph_model::PropertyPath;
use tracing::debug;

use crate::change::{ChangeInfo, DocumentChange};

/// Name under which the document registers its [`PathNotifier`]
pub const PATH_PROXY: &str = "path";

pub type ListenerId = u64;

pub type ChangeCallback = Box<dyn FnMut(&DocumentChange, &ChangeInfo)>;

/// Interest-filtering relay for document changes
pub trait EventProxy: Any {
    fn name(&self) -> &str;

    fn on_document_changed(&mut self, change: &DocumentChange, info: &ChangeInfo);

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Notifies observers registered for specific property paths
///
/// Each observer is called at most once per change, for changes that
/// `set` or `update` its property (or anything below it).
#[derive(Default)]
pub struct PathNotifier {
    listeners: HashMap<PropertyPath, Vec<(ListenerId, ChangeCallback)>>,
    next_id: ListenerId,
}

impl PathNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for changes to the property at `path`
    pub fn connect<F>(&mut self, path: impl Into<PropertyPath>, callback: F) -> ListenerId
    where
        F: FnMut(&DocumentChange, &ChangeInfo) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        let path = path.into().property_path();
        self.listeners
            .entry(path)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    /// Removes a listener; returns whether it was registered
    pub fn disconnect(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, listeners| {
            let count = listeners.len();
            listeners.retain(|(listener, _)| *listener != id);
            removed |= listeners.len() != count;
            !listeners.is_empty()
        });
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

impl EventProxy for PathNotifier {
    fn name(&self) -> &str {
        PATH_PROXY
    }

    fn on_document_changed(&mut self, change: &DocumentChange, info: &ChangeInfo) {
        for path in change.updated_paths() {
            if let Some(listeners) = self.listeners.get_mut(&path) {
                debug!("Notifying {} listeners of {}", listeners.len(), path);
                for (_, callback) in listeners.iter_mut() {
                    callback(change, info);
                }
            }
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for PathNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathNotifier")
            .field("paths", &self.listeners.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_model::{Diff, ObjectOperation};
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn change(ops: Vec<ObjectOperation>) -> DocumentChange {
        DocumentChange::new(ops, Value::Null, Value::Null)
    }

    #[test]
    fn test_notifies_only_interested_listeners() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = PathNotifier::new();

        let log = Rc::clone(&calls);
        notifier.connect(["p1", "text"], move |_, info: &ChangeInfo| {
            log.borrow_mut().push(("p1", info.replay));
        });
        let log = Rc::clone(&calls);
        notifier.connect(["p2", "text"], move |_, info: &ChangeInfo| {
            log.borrow_mut().push(("p2", info.replay));
        });

        notifier.on_document_changed(
            &change(vec![
                ObjectOperation::set(["p1", "text"], "a"),
                ObjectOperation::update(["p1", "text"], Diff::insert_text(0, "b")),
            ]),
            &ChangeInfo::replay(),
        );

        assert_eq!(*calls.borrow(), vec![("p1", true)]);
    }

    #[test]
    fn test_nested_updates_notify_property_listeners() {
        let count = Rc::new(RefCell::new(0));
        let mut notifier = PathNotifier::new();
        let counter = Rc::clone(&count);
        notifier.connect(["list", "items"], move |_, _| *counter.borrow_mut() += 1);

        notifier.on_document_changed(
            &change(vec![ObjectOperation::set(["list", "items", "0"], json!("x"))]),
            &ChangeInfo::default(),
        );
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_disconnect() {
        let mut notifier = PathNotifier::new();
        let id = notifier.connect(["p1", "text"], |_, _| {});
        notifier.connect(["p1", "text"], |_, _| {});
        assert_eq!(notifier.listener_count(), 2);

        assert!(notifier.disconnect(id));
        assert!(!notifier.disconnect(id));
        assert_eq!(notifier.listener_count(), 1);
    }
}
