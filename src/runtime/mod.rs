mod dom;
mod node;
mod scheduler;

pub use dom::{DomError, DomHelper, DomPatch, ElementId, MemoryDom};
pub use node::{Cleanup, MorphNode, NodeId, NodeTable};
pub use scheduler::{FlushSummary, Immediate, RunLoop, Scheduler, Task};
