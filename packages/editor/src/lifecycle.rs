use docgraph_model::Node;

/// Per-node behavior attached to the committed document
///
/// Each hook runs once per node, after the committed store finished
/// creating or deleting it (undo and redo included). Staging never
/// triggers hooks.
pub trait NodeLifecycle {
    /// Node was created in the committed store
    fn attach(&mut self, node: &Node);

    /// Node was deleted from the committed store
    fn detach(&mut self, node: &Node);
}
