//! Cooperative single-turn scheduling.
//!
//! The deferral engine needs exactly one scheduling primitive from its host:
//! "run this after the current synchronous call stack fully unwinds, before
//! the next macro-level event". [`Scheduler`] is that seam; [`TurnQueue`] is
//! the in-process implementation the embedding host pumps between events.
//!
//! Turn discipline: a task scheduled during a turn does not run in that turn.
//! [`TurnQueue::tick`] snapshots the queue length on entry and runs exactly
//! that many tasks, so one tick equals one scheduling turn.

use std::cell::RefCell;
use std::collections::VecDeque;

/// A deferred continuation.
pub type Task = Box<dyn FnOnce()>;

/// The "run after the current stack unwinds" primitive.
pub trait Scheduler {
    fn schedule(&self, task: Task);
}

/// FIFO turn runner for a single-threaded cooperative host.
#[derive(Default)]
pub struct TurnQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TurnQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any task is waiting for a turn.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run one scheduling turn: every task that was already queued when the
    /// tick began, in FIFO order. Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        let due = self.tasks.borrow().len();
        for _ in 0..due {
            // Pop outside the borrow: a running task may schedule more.
            let task = self.tasks.borrow_mut().pop_front();
            let Some(task) = task else { break };
            task();
        }
        due
    }

    /// Tick until no tasks remain. Returns the total number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        while !self.is_idle() {
            total += self.tick();
        }
        total
    }
}

impl Scheduler for TurnQueue {
    fn schedule(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}
