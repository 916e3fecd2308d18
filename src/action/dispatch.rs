use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::DEFAULT_MARKER_ATTRIBUTE;
use crate::error::ActionError;
use crate::event::{ActionEvent, DispatchOutcome};
use crate::id::ActionId;
use crate::runtime::{DomHelper, ElementId, NodeTable, Scheduler};
use crate::value::Capability;

use super::binding::ActionBinding;
use super::gate::{decide_with, ClickHeuristic, SimpleClick};
use super::registry::{ActionRegistry, RegistryEntry};

/// What happened to one registered action for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// No entry under that id; it was torn down already.
    Unregistered,
    /// The entry listens for a different event.
    OtherEvent,
    /// The event gate rejected the event.
    Suppressed,
    /// The entry's node is gone.
    Detached,
    Scheduled,
}

/// Runs registered actions for events found by the delegated listener.
pub struct ActionDispatcher {
    registry: Rc<ActionRegistry>,
    nodes: Rc<RefCell<NodeTable>>,
    scheduler: Rc<dyn Scheduler>,
    clicks: Box<dyn ClickHeuristic>,
    marker_attribute: String,
}

impl ActionDispatcher {
    pub fn new(
        registry: Rc<ActionRegistry>,
        nodes: Rc<RefCell<NodeTable>>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            registry,
            nodes,
            scheduler,
            clicks: Box::new(SimpleClick),
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
        }
    }

    pub fn with_marker_attribute(mut self, marker_attribute: impl Into<String>) -> Self {
        self.marker_attribute = marker_attribute.into();
        self
    }

    pub fn with_click_heuristic(mut self, clicks: impl ClickHeuristic + 'static) -> Self {
        self.clicks = Box::new(clicks);
        self
    }

    pub fn is_listening(&self, event_type: &str) -> bool {
        self.registry.is_listening(event_type)
    }

    /// Delegated listener: walk `chain` (target first) and run the action
    /// of every tagged element, until propagation is stopped.
    ///
    /// A failing action does not cut the walk short; ancestors still see
    /// the event and the first error is returned once the walk ends.
    pub fn dispatch_event<D>(
        &self,
        dom: &D,
        chain: &[ElementId],
        event: &mut ActionEvent,
    ) -> Result<DispatchOutcome, ActionError>
    where
        D: DomHelper + ?Sized,
    {
        let mut outcome = DispatchOutcome::default();
        if !self.is_listening(event.event_type()) {
            return Ok(outcome);
        }

        let mut first_error = None;
        for &element in chain {
            let Some(raw_id) = dom.get_attribute(element, &self.marker_attribute) else {
                continue;
            };
            let action_id = ActionId::from(raw_id);
            match self.handle_action(&action_id, event) {
                Ok(HandlerResult::Scheduled) => outcome.actions_scheduled += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(action_id = %action_id, element = %element, "action failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        outcome.default_prevented = event.default_prevented();
        outcome.propagation_stopped = event.propagation_stopped();
        Ok(outcome)
    }

    /// Run the action registered under `action_id` if it wants this event.
    pub fn handle_action(
        &self,
        action_id: &ActionId,
        event: &mut ActionEvent,
    ) -> Result<HandlerResult, ActionError> {
        let Some(entry) = self.registry.lookup(action_id) else {
            trace!(action_id = %action_id, "no action registered");
            return Ok(HandlerResult::Unregistered);
        };
        if entry.event_name != event.event_type() {
            return Ok(HandlerResult::OtherEvent);
        }
        self.run_entry(action_id, &entry, event)
    }

    fn run_entry(
        &self,
        action_id: &ActionId,
        entry: &RegistryEntry,
        event: &mut ActionEvent,
    ) -> Result<HandlerResult, ActionError> {
        if !decide_with(event, entry.allowed_keys.as_ref(), self.clicks.as_ref()) {
            trace!(
                action_id = %action_id,
                event = event.event_type(),
                modifiers = ?event.modifiers(),
                "event gate suppressed action"
            );
            return Ok(HandlerResult::Suppressed);
        }

        if entry.prevent_default {
            event.prevent_default();
        }
        if !entry.bubbles {
            event.stop_propagation();
        }

        let binding = self.nodes.borrow().binding(entry.node).cloned();
        let Some(binding) = binding else {
            warn!(
                action_id = %action_id,
                node = %entry.node,
                "action registered for a node that no longer exists"
            );
            return Ok(HandlerResult::Detached);
        };

        debug!(
            action_id = %action_id,
            action = %binding.action_name,
            args = binding.action_args.len(),
            "scheduling action"
        );
        self.scheduler
            .schedule(Box::new(move || invoke_action(&binding)))?;
        Ok(HandlerResult::Scheduled)
    }
}

/// Deliver the action to its target: generic `send` first, then a method
/// named after the action.
pub fn invoke_action(binding: &ActionBinding) -> Result<(), ActionError> {
    let ActionBinding {
        target,
        action_name,
        action_args,
    } = binding;

    let result = match Capability::resolve(target, action_name) {
        Capability::Send(sender) => sender.send(action_name, action_args),
        Capability::NamedMethod(method) => method(action_args.as_slice()),
        Capability::Neither => {
            return Err(ActionError::MissingAction {
                action: action_name.clone(),
                target: format!("{target:?}"),
            })
        }
    };

    result.map_err(|source| ActionError::Handler {
        action: action_name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use keyboard_types::Modifiers;

    use super::*;
    use crate::action::{ActionOptions, AllowList, ModifierKey};
    use crate::id::{IdGenerator, IdStrategy};
    use crate::runtime::{Immediate, RunLoop};
    use crate::value::{ObjectTarget, Value};

    struct Fixture {
        registry: Rc<ActionRegistry>,
        nodes: Rc<RefCell<NodeTable>>,
        calls: Rc<RefCell<Vec<(String, Vec<Value>)>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Rc::new(ActionRegistry::new(IdGenerator::new(IdStrategy::Sequential))),
                nodes: Rc::new(RefCell::new(NodeTable::new())),
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn sender(&self) -> Value {
            let calls = Rc::clone(&self.calls);
            Value::object(ObjectTarget::new("controller").with_send(move |name, args| {
                calls.borrow_mut().push((name.to_string(), args.to_vec()));
                Ok(())
            }))
        }

        fn bind(&self, target: Value, options: ActionOptions) -> ActionId {
            let node = self.nodes.borrow_mut().create(ElementId(0));
            self.nodes.borrow_mut().get_mut(node).unwrap().replace_state(ActionBinding {
                target,
                action_name: "save".to_string(),
                action_args: vec![Value::from(7)],
            });
            self.registry.register(RegistryEntry {
                event_name: options.event_name_or("click").to_string(),
                node,
                prevent_default: options.should_prevent_default(),
                bubbles: options.should_bubble(),
                allowed_keys: options.allowed_keys,
            })
        }

        fn dispatcher(&self, scheduler: Rc<dyn Scheduler>) -> ActionDispatcher {
            ActionDispatcher::new(Rc::clone(&self.registry), Rc::clone(&self.nodes), scheduler)
        }
    }

    #[test]
    fn approved_event_is_deferred_until_flush() {
        let f = Fixture::new();
        let id = f.bind(f.sender(), ActionOptions::default());
        let run_loop = Rc::new(RunLoop::default());
        let dispatcher = f.dispatcher(run_loop.clone());

        let mut event = ActionEvent::new("click", ElementId(0));
        let result = dispatcher.handle_action(&id, &mut event).unwrap();

        assert_eq!(result, HandlerResult::Scheduled);
        assert!(event.default_prevented());
        assert!(!event.propagation_stopped());
        assert!(f.calls.borrow().is_empty());

        run_loop.flush().unwrap();
        assert_eq!(
            *f.calls.borrow(),
            vec![("save".to_string(), vec![Value::from(7)])]
        );
    }

    #[test]
    fn suppressed_event_touches_nothing() {
        let f = Fixture::new();
        let id = f.bind(f.sender(), ActionOptions::default());
        let dispatcher = f.dispatcher(Rc::new(Immediate));

        let mut event = ActionEvent::new("click", ElementId(0)).with_modifiers(Modifiers::META);
        let result = dispatcher.handle_action(&id, &mut event).unwrap();

        assert_eq!(result, HandlerResult::Suppressed);
        assert!(!event.default_prevented());
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn suppression_flags_follow_options() {
        let f = Fixture::new();
        let id = f.bind(
            f.sender(),
            ActionOptions::default().prevent_default(false).bubbles(false),
        );
        let dispatcher = f.dispatcher(Rc::new(Immediate));

        let mut event = ActionEvent::new("click", ElementId(0));
        dispatcher.handle_action(&id, &mut event).unwrap();
        assert!(!event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[test]
    fn other_events_and_unknown_ids_are_ignored() {
        let f = Fixture::new();
        let id = f.bind(
            f.sender(),
            ActionOptions::default()
                .on("keydown")
                .allowed_keys(AllowList::of([ModifierKey::Shift])),
        );
        let dispatcher = f.dispatcher(Rc::new(Immediate));

        let mut click = ActionEvent::new("click", ElementId(0));
        assert_eq!(
            dispatcher.handle_action(&id, &mut click).unwrap(),
            HandlerResult::OtherEvent
        );
        let mut keydown = ActionEvent::new("keydown", ElementId(0));
        assert_eq!(
            dispatcher
                .handle_action(&ActionId::from("missing"), &mut keydown)
                .unwrap(),
            HandlerResult::Unregistered
        );
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn detached_node_is_skipped() {
        let f = Fixture::new();
        let id = f.bind(f.sender(), ActionOptions::default());
        let node = f.registry.lookup(&id).unwrap().node;
        // Drop the node without running its teardown path.
        f.nodes.borrow_mut().remove(node);
        let dispatcher = f.dispatcher(Rc::new(Immediate));

        let mut event = ActionEvent::new("click", ElementId(0));
        assert_eq!(
            dispatcher.handle_action(&id, &mut event).unwrap(),
            HandlerResult::Detached
        );
    }

    #[test]
    fn named_method_receives_args() {
        let saved = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&saved);
        let target = Value::object(ObjectTarget::new("component").with_method("save", move |args| {
            if let Some(Value::Number(n)) = args.first() {
                sink.set(*n);
            }
            Ok(())
        }));
        let binding = ActionBinding {
            target,
            action_name: "save".to_string(),
            action_args: vec![Value::from(3)],
        };

        invoke_action(&binding).unwrap();
        assert_eq!(saved.get(), 3.0);
    }

    #[test]
    fn missing_capability_is_a_configuration_error() {
        let binding = ActionBinding {
            target: Value::object(ObjectTarget::new("component")),
            action_name: "save".to_string(),
            action_args: Vec::new(),
        };
        let err = invoke_action(&binding).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "The action 'save' did not exist on Object(<component>)"
        );
    }

    #[test]
    fn handler_failures_carry_the_action_name() {
        let binding = ActionBinding {
            target: Value::object(
                ObjectTarget::new("component")
                    .with_method("save", |_| Err(anyhow::anyhow!("disk full"))),
            ),
            action_name: "save".to_string(),
            action_args: Vec::new(),
        };
        let err = invoke_action(&binding).unwrap_err();
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "action 'save' failed: disk full");
    }
}
