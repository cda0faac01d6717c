use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use crate::error::Error;

pub type Task = Box<dyn FnOnce()>;

/// One-shot delayed tasks on the host's event loop.
pub trait Scheduler: Clone + 'static {
    type Handle;

    fn schedule(&self, delay: Duration, task: Task) -> Result<Self::Handle, Error>;

    /// Cancelling a task that already ran does nothing.
    fn cancel(&self, handle: Self::Handle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Duration,
    seq: u64,
}

impl TimerId {
    pub fn due(&self) -> Duration {
        self.due
    }
}

#[derive(Default)]
struct Queue {
    now: Duration,
    seq: u64,
    tasks: BTreeMap<TimerId, Task>,
}

/// Scheduler with a virtual clock that only moves on `advance`.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Queue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().tasks.len()
    }

    /// Moves the clock forward by `by`, running every task that comes due on
    /// the way in deadline order. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        loop {
            let task = {
                let mut queue = self.queue.borrow_mut();
                let next = queue.tasks.keys().next().copied();
                match next {
                    Some(id) if id.due <= target => {
                        queue.now = id.due;
                        queue.tasks.remove(&id)
                    }
                    _ => None,
                }
            };
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        self.queue.borrow_mut().now = target;
        ran
    }
}

impl Scheduler for ManualScheduler {
    type Handle = TimerId;

    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerId, Error> {
        let mut queue = self.queue.borrow_mut();
        let id = TimerId {
            due: queue.now + delay,
            seq: queue.seq,
        };
        queue.seq += 1;
        queue.tasks.insert(id, task);
        Ok(id)
    }

    fn cancel(&self, handle: TimerId) {
        self.queue.borrow_mut().tasks.remove(&handle);
    }
}
