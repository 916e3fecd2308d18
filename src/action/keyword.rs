use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::ActionError;
use crate::id::ActionId;
use crate::runtime::{DomError, DomHelper, NodeId, NodeTable};
use crate::scope::{Hooks, Scope};

use super::binding::{setup_state, ActionBinding, ActionInvocation, ActionOptions};
use super::registry::{ActionRegistry, RegistryEntry};

/// Binds template nodes to registry entries and tags their elements.
pub struct ActionKeyword {
    registry: Rc<ActionRegistry>,
    nodes: Rc<RefCell<NodeTable>>,
    marker_attribute: String,
    default_event: String,
}

impl ActionKeyword {
    pub fn new(
        registry: Rc<ActionRegistry>,
        nodes: Rc<RefCell<NodeTable>>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            registry,
            nodes,
            marker_attribute: config.marker_attribute.clone(),
            default_event: config.default_event.clone(),
        }
    }

    pub fn setup_state<H>(
        &self,
        hooks: &H,
        scope: &Scope,
        invocation: &ActionInvocation,
    ) -> Result<ActionBinding, ActionError>
    where
        H: Hooks + ?Sized,
    {
        setup_state(hooks, scope, &invocation.params, &invocation.options)
    }

    /// The registry entry survives re-renders; only the binding changes.
    pub fn is_stable(&self) -> bool {
        true
    }

    /// Evaluate `node`: refresh its binding and, on first render, register
    /// it. Later calls reuse the existing registration.
    pub fn apply<H, D>(
        &self,
        node: NodeId,
        hooks: &H,
        scope: &Scope,
        invocation: &ActionInvocation,
        dom: &mut D,
    ) -> Result<ActionId, ActionError>
    where
        H: Hooks + ?Sized,
        D: DomHelper + ?Sized,
    {
        let state = self.setup_state(hooks, scope, invocation)?;
        let existing = {
            let mut nodes = self.nodes.borrow_mut();
            let entry = nodes.get_mut(node).ok_or(ActionError::UnknownNode(node))?;
            entry.replace_state(state);
            entry.action_id().cloned()
        };

        match existing {
            Some(action_id) if self.is_stable() => Ok(action_id),
            _ => self.render(node, &invocation.options, dom),
        }
    }

    /// Register `node`, attach its teardown and write the marker attribute.
    pub fn render<D>(
        &self,
        node: NodeId,
        options: &ActionOptions,
        dom: &mut D,
    ) -> Result<ActionId, ActionError>
    where
        D: DomHelper + ?Sized,
    {
        let element = self
            .nodes
            .borrow()
            .get(node)
            .map(|entry| entry.element())
            .ok_or(ActionError::UnknownNode(node))?;

        let action_id = self.registry.register(RegistryEntry {
            event_name: options.event_name_or(&self.default_event).to_string(),
            node,
            prevent_default: options.should_prevent_default(),
            bubbles: options.should_bubble(),
            allowed_keys: options.allowed_keys.clone(),
        });

        let registry = Rc::clone(&self.registry);
        let cleanup_id = action_id.clone();
        if let Some(entry) = self.nodes.borrow_mut().get_mut(node) {
            entry.attach_action(
                action_id.clone(),
                Box::new(move || {
                    registry.unregister(&cleanup_id);
                }),
            );
        }

        if let Err(err) = dom.set_attribute(element, &self.marker_attribute, action_id.as_str()) {
            if let Some(entry) = self.nodes.borrow_mut().get_mut(node) {
                entry.teardown();
            }
            return Err(err.into());
        }

        debug!(action_id = %action_id, node = %node, element = %element, "bound action");
        Ok(action_id)
    }

    /// Tear down `node`: unregister its action and strip the marker
    /// attribute from its element. Safe to call repeatedly.
    pub fn teardown<D>(&self, node: NodeId, dom: &mut D) -> Result<bool, ActionError>
    where
        D: DomHelper + ?Sized,
    {
        let removed = self.nodes.borrow_mut().remove(node);
        let Some(mut entry) = removed else {
            return Ok(false);
        };
        let element = entry.element();
        if !entry.teardown() {
            return Ok(false);
        }

        match dom.remove_attribute(element, &self.marker_attribute) {
            // Element already gone; nothing left tagged.
            Ok(()) | Err(DomError::UnknownElement(_)) => {}
            Err(err) => return Err(err.into()),
        }
        debug!(node = %node, element = %element, "unbound action");
        Ok(true)
    }
}
