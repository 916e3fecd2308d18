use std::collections::HashMap;
use std::fmt;

use crate::action::ActionBinding;
use crate::id::ActionId;

use super::dom::ElementId;

/// Teardown hook attached to a node, run once when the node goes away.
pub type Cleanup = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A rendered template node that owns an action binding.
pub struct MorphNode {
    element: ElementId,
    state: Option<ActionBinding>,
    action_id: Option<ActionId>,
    cleanup: Option<Cleanup>,
}

impl MorphNode {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            state: None,
            action_id: None,
            cleanup: None,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn state(&self) -> Option<&ActionBinding> {
        self.state.as_ref()
    }

    /// Swap in a freshly resolved binding; readers see either the old or
    /// the new triple, never a mix.
    pub fn replace_state(&mut self, state: ActionBinding) -> Option<ActionBinding> {
        self.state.replace(state)
    }

    pub fn action_id(&self) -> Option<&ActionId> {
        self.action_id.as_ref()
    }

    pub(crate) fn attach_action(&mut self, action_id: ActionId, cleanup: Cleanup) {
        self.action_id = Some(action_id);
        self.cleanup = Some(cleanup);
    }

    /// Runs the cleanup hook if it has not run yet.
    pub fn teardown(&mut self) -> bool {
        self.action_id = None;
        match self.cleanup.take() {
            Some(cleanup) => {
                cleanup();
                true
            }
            None => false,
        }
    }
}

impl Drop for MorphNode {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for MorphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorphNode")
            .field("element", &self.element)
            .field("state", &self.state)
            .field("action_id", &self.action_id)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Table of live nodes; registry entries refer into it by [`NodeId`].
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: HashMap<NodeId, MorphNode>,
    next_id: u64,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, element: ElementId) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, MorphNode::new(element));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&MorphNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MorphNode> {
        self.nodes.get_mut(&id)
    }

    /// Current binding of a live node.
    pub fn binding(&self, id: NodeId) -> Option<&ActionBinding> {
        self.nodes.get(&id).and_then(MorphNode::state)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Detach a node from the table. Its cleanup runs when the returned
    /// node is torn down or dropped, so callers can release their borrow
    /// on the table first.
    pub fn remove(&mut self, id: NodeId) -> Option<MorphNode> {
        self.nodes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::value::Value;

    fn binding(name: &str) -> ActionBinding {
        ActionBinding {
            target: Value::Undefined,
            action_name: name.to_string(),
            action_args: Vec::new(),
        }
    }

    #[test]
    fn replace_state_returns_previous_binding() {
        let mut table = NodeTable::new();
        let id = table.create(ElementId(0));
        let node = table.get_mut(id).unwrap();

        assert!(node.replace_state(binding("save")).is_none());
        let previous = node.replace_state(binding("delete")).unwrap();
        assert_eq!(previous.action_name, "save");
        assert_eq!(table.binding(id).unwrap().action_name, "delete");
    }

    #[test]
    fn cleanup_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let mut table = NodeTable::new();
        let id = table.create(ElementId(0));
        let counter = Rc::clone(&runs);
        table
            .get_mut(id)
            .unwrap()
            .attach_action(ActionId::from("1"), Box::new(move || counter.set(counter.get() + 1)));

        let mut node = table.remove(id).unwrap();
        assert!(node.teardown());
        assert!(!node.teardown());
        drop(node);
        assert_eq!(runs.get(), 1);
        assert!(table.remove(id).is_none());
    }

    #[test]
    fn dropping_a_node_runs_its_cleanup() {
        let runs = Rc::new(Cell::new(0));
        let mut table = NodeTable::new();
        let id = table.create(ElementId(0));
        let counter = Rc::clone(&runs);
        table
            .get_mut(id)
            .unwrap()
            .attach_action(ActionId::from("2"), Box::new(move || counter.set(counter.get() + 1)));

        drop(table);
        assert_eq!(runs.get(), 1);
    }
}
