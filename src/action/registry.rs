use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::id::{ActionId, IdGenerator};
use crate::runtime::NodeId;

use super::gate::AllowList;

/// Everything the delegated listener needs to run one bound action.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub event_name: String,
    /// Lookup-only reference to the owning node.
    pub node: NodeId,
    pub prevent_default: bool,
    pub bubbles: bool,
    pub allowed_keys: Option<AllowList>,
}

/// Identifier → entry store shared by the binder and the delegated listener.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    ids: IdGenerator,
    entries: RefCell<HashMap<ActionId, RegistryEntry>>,
}

impl ActionRegistry {
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            ids,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Store `entry` under a fresh identifier.
    pub fn register(&self, entry: RegistryEntry) -> ActionId {
        let action_id = self.ids.next_id();
        debug!(
            action_id = %action_id,
            event = %entry.event_name,
            node = %entry.node,
            "registered action"
        );
        self.entries.borrow_mut().insert(action_id.clone(), entry);
        action_id
    }

    /// Remove an entry. Unknown ids are ignored; returns whether anything
    /// was removed.
    pub fn unregister(&self, action_id: &ActionId) -> bool {
        let removed = self.entries.borrow_mut().remove(action_id).is_some();
        if removed {
            debug!(action_id = %action_id, "unregistered action");
        }
        removed
    }

    /// Copy of the entry, so no borrow outlives the lookup.
    pub fn lookup(&self, action_id: &ActionId) -> Option<RegistryEntry> {
        self.entries.borrow().get(action_id).cloned()
    }

    pub fn contains(&self, action_id: &ActionId) -> bool {
        self.entries.borrow().contains_key(action_id)
    }

    /// Whether any entry waits for `event_name`.
    pub fn is_listening(&self, event_name: &str) -> bool {
        self.entries
            .borrow()
            .values()
            .any(|entry| entry.event_name == event_name)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Snapshot of every registered action for plugins that inspect the
    /// table. Later registrations do not show up in it.
    pub fn registered_actions(&self) -> HashMap<ActionId, RegistryEntry> {
        self.entries.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdStrategy;
    use crate::runtime::{ElementId, NodeTable};

    fn entry(event_name: &str) -> RegistryEntry {
        let mut nodes = NodeTable::new();
        RegistryEntry {
            event_name: event_name.to_string(),
            node: nodes.create(ElementId(0)),
            prevent_default: true,
            bubbles: true,
            allowed_keys: None,
        }
    }

    #[test]
    fn register_then_unregister() {
        let registry = ActionRegistry::new(IdGenerator::new(IdStrategy::Sequential));
        let id = registry.register(entry("click"));

        assert!(registry.contains(&id));
        assert_eq!(registry.lookup(&id).unwrap().event_name, "click");
        assert!(registry.unregister(&id));
        assert!(!registry.contains(&id));
        assert!(!registry.unregister(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn listens_only_for_registered_events() {
        let registry = ActionRegistry::default();
        registry.register(entry("keydown"));
        assert!(registry.is_listening("keydown"));
        assert!(!registry.is_listening("click"));
    }

    #[test]
    fn exposes_the_whole_table() {
        let registry = ActionRegistry::default();
        let first = registry.register(entry("click"));
        let second = registry.register(entry("submit"));
        let actions = registry.registered_actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[&first].event_name, "click");
        assert_eq!(actions[&second].event_name, "submit");
    }

    #[test]
    fn snapshot_does_not_block_mutation() {
        let registry = ActionRegistry::default();
        let first = registry.register(entry("click"));
        let snapshot = registry.registered_actions();

        let second = registry.register(entry("submit"));
        assert!(registry.unregister(&first));

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&first));
        assert!(!snapshot.contains_key(&second));
        assert_eq!(registry.len(), 1);
    }
}
