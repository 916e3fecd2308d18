use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{ActionDispatcher, ActionInvocation, ActionKeyword, ActionRegistry};
use crate::config::RuntimeConfig;
use crate::error::ActionError;
use crate::event::{ActionEvent, DispatchOutcome};
use crate::id::{ActionId, IdGenerator};
use crate::runtime::{
    DomHelper, ElementId, FlushSummary, NodeId, NodeTable, RunLoop, Scheduler,
};
use crate::scope::{Hooks, Scope};

/// Everything needed to bind and dispatch actions for one document.
pub struct ActionSystem {
    config: RuntimeConfig,
    registry: Rc<ActionRegistry>,
    nodes: Rc<RefCell<NodeTable>>,
    run_loop: Rc<RunLoop>,
    keyword: ActionKeyword,
    dispatcher: ActionDispatcher,
}

impl ActionSystem {
    /// Handlers are deferred into the system's own run loop.
    pub fn new(config: RuntimeConfig) -> Self {
        let run_loop = Rc::new(RunLoop::new(config.max_flush_tasks));
        let scheduler: Rc<dyn Scheduler> = run_loop.clone();
        Self::build(config, run_loop, scheduler)
    }

    /// Route handler invocations through `scheduler` instead of the run loop.
    /// With a synchronous scheduler handler errors surface from
    /// [`dispatch_event`](Self::dispatch_event) after the whole chain ran.
    pub fn with_scheduler(config: RuntimeConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        let run_loop = Rc::new(RunLoop::new(config.max_flush_tasks));
        Self::build(config, run_loop, scheduler)
    }

    fn build(config: RuntimeConfig, run_loop: Rc<RunLoop>, scheduler: Rc<dyn Scheduler>) -> Self {
        let registry = Rc::new(ActionRegistry::new(IdGenerator::new(config.id_strategy)));
        let nodes = Rc::new(RefCell::new(NodeTable::new()));
        let keyword = ActionKeyword::new(Rc::clone(&registry), Rc::clone(&nodes), &config);
        let dispatcher =
            ActionDispatcher::new(Rc::clone(&registry), Rc::clone(&nodes), scheduler)
                .with_marker_attribute(config.marker_attribute.clone());
        Self {
            config,
            registry,
            nodes,
            run_loop,
            keyword,
            dispatcher,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Rc<ActionRegistry> {
        &self.registry
    }

    pub fn nodes(&self) -> &Rc<RefCell<NodeTable>> {
        &self.nodes
    }

    pub fn run_loop(&self) -> &Rc<RunLoop> {
        &self.run_loop
    }

    pub fn keyword(&self) -> &ActionKeyword {
        &self.keyword
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn create_node(&self, element: ElementId) -> NodeId {
        self.nodes.borrow_mut().create(element)
    }

    /// Render (or re-render) the action binding of `node`.
    pub fn render_action<H, D>(
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
        self.keyword.apply(node, hooks, scope, invocation, dom)
    }

    /// Unbind `node` and untag its element. Returns `false` when there was
    /// nothing to tear down.
    pub fn destroy_node<D>(&self, node: NodeId, dom: &mut D) -> Result<bool, ActionError>
    where
        D: DomHelper + ?Sized,
    {
        self.keyword.teardown(node, dom)
    }

    /// Hand one DOM event to the delegated listener. Handlers run on the
    /// next [`flush`](Self::flush).
    pub fn dispatch_event<D>(
        &self,
        dom: &D,
        chain: &[ElementId],
        event: &mut ActionEvent,
    ) -> Result<DispatchOutcome, ActionError>
    where
        D: DomHelper + ?Sized,
    {
        self.dispatcher.dispatch_event(dom, chain, event)
    }

    pub fn flush(&self) -> Result<FlushSummary, ActionError> {
        self.run_loop.flush()
    }
}

impl Default for ActionSystem {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
