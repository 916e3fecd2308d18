// Library exports for testing

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod runtime;
pub mod scope;
pub mod system;
pub mod value;

// Re-export commonly used types for tests
pub use action::{ActionBinding, ActionInvocation, ActionOptions, ActionRegistry, AllowList};
pub use config::RuntimeConfig;
pub use error::ActionError;
pub use event::{ActionEvent, DispatchOutcome, MouseButton};
pub use id::ActionId;
pub use runtime::{ElementId, MemoryDom, NodeId};
pub use scope::{Expr, PathHooks, Scope};
pub use system::ActionSystem;
pub use value::{ObjectTarget, Value};
