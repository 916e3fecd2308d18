//! Action binding: resolve, register, gate and dispatch template actions.

mod binding;
mod dispatch;
mod gate;
mod keyword;
mod registry;

pub use binding::{setup_state, ActionBinding, ActionInvocation, ActionOptions, TargetOption};
pub use dispatch::{invoke_action, ActionDispatcher, HandlerResult};
pub use gate::{
    decide, decide_with, is_pointer_event, AllowList, ClickHeuristic, ModifierKey, SimpleClick,
    MODIFIERS,
};
pub use keyword::ActionKeyword;
pub use registry::{ActionRegistry, RegistryEntry};
