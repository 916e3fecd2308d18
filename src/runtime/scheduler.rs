use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::DEFAULT_MAX_FLUSH_TASKS;
use crate::error::ActionError;

/// Deferred unit of work; errors surface from the flush that runs it.
pub type Task = Box<dyn FnOnce() -> Result<(), ActionError>>;

/// The batching primitive handler invocations are routed through.
pub trait Scheduler {
    fn schedule(&self, task: Task) -> Result<(), ActionError>;
}

/// Runs every task on the spot. Meant for tests that want synchronous
/// dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl Scheduler for Immediate {
    fn schedule(&self, task: Task) -> Result<(), ActionError> {
        task()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushSummary {
    pub tasks_run: usize,
    pub rendered: bool,
}

/// FIFO task queue drained by [`RunLoop::flush`] after the current event
/// has been handled.
pub struct RunLoop {
    queue: RefCell<VecDeque<Task>>,
    max_tasks: usize,
    flushing: Cell<bool>,
    render_requested: Cell<bool>,
    render: RefCell<Option<Box<dyn FnMut()>>>,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FLUSH_TASKS)
    }
}

impl RunLoop {
    pub fn new(max_tasks: usize) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            max_tasks: max_tasks.max(1),
            flushing: Cell::new(false),
            render_requested: Cell::new(false),
            render: RefCell::new(None),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Install the callback that performs a render pass.
    pub fn on_render(&self, render: impl FnMut() + 'static) {
        *self.render.borrow_mut() = Some(Box::new(render));
    }

    /// Ask for a render pass at the end of the current flush. Repeated
    /// requests within one flush coalesce.
    pub fn request_render(&self) {
        self.render_requested.set(true);
    }

    /// Drain the queue, including tasks scheduled by running tasks, then
    /// render once if anything asked for it.
    ///
    /// A failing task stops the flush; tasks behind it stay queued for the
    /// next one. Calling `flush` from inside a task is a no-op, the outer
    /// flush picks up whatever the task queued.
    pub fn flush(&self) -> Result<FlushSummary, ActionError> {
        if self.flushing.replace(true) {
            return Ok(FlushSummary::default());
        }
        let result = self.drain();
        self.flushing.set(false);
        let tasks_run = result?;

        let rendered = self.render_requested.replace(false);
        if rendered {
            if let Some(render) = self.render.borrow_mut().as_mut() {
                render();
            }
        }

        if tasks_run > 0 {
            debug!(tasks_run, rendered, "run loop flushed");
        }
        Ok(FlushSummary {
            tasks_run,
            rendered,
        })
    }

    fn drain(&self) -> Result<usize, ActionError> {
        let mut tasks_run = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task()?;
            tasks_run += 1;
            if tasks_run >= self.max_tasks {
                warn!(
                    max_tasks = self.max_tasks,
                    pending = self.pending(),
                    "stopped flushing run loop (possible infinite loop)"
                );
                break;
            }
        }
        Ok(tasks_run)
    }
}

impl Scheduler for RunLoop {
    fn schedule(&self, task: Task) -> Result<(), ActionError> {
        self.queue.borrow_mut().push_back(task);
        Ok(())
    }
}
