//! Blocking coordinator: nesting depth, the pending-signal queue, and drain
//! scheduling.
//!
//! One coordinator exists per session and is shared by every request wrapper
//! and message port. It tracks how many synchronous (blocking) sends are
//! currently on the stack, decides for each incoming signal whether it may
//! run now or must be queued, and replays the queue in FIFO order once the
//! outermost blocking call has returned and its stack has unwound.
//!
//! Depth accounting: each synchronous send increments the depth on entry.
//! The *outermost* call (depth 1 when it ends) does not decrement on return;
//! it stays at 1 until its drain runs, so signals arriving between the
//! return and the drain turn still queue behind the older deferred items.
//! Nested calls (depth >= 2 when they end) decrement immediately and never
//! schedule a drain of their own; the outer round's pass picks up whatever
//! they queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::error::Result;
use crate::scheduler::Scheduler;

/// A queued replay action: closure over handler, request state, and the raw
/// signal arguments captured at queue time.
pub type ReplayTask = Box<dyn FnOnce() -> Result<()>>;

/// Verdict for one incoming signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No blocking window is open (or the signal belongs to a synchronous
    /// request itself); deliver immediately.
    RunNow,
    /// A blocking window is open; the caller must push a replay closure.
    Queue,
}

/// Counters from one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    /// Closures replayed successfully.
    pub replayed: usize,
    /// Closures whose handler returned an error (logged, drain continued).
    pub failed: usize,
}

impl DrainOutcome {
    #[must_use]
    pub const fn total(self) -> usize {
        self.replayed + self.failed
    }
}

pub struct Coordinator {
    // Back-reference to the owning Rc, for the scheduled drain closure.
    this: Weak<Coordinator>,
    scheduler: Rc<dyn Scheduler>,
    depth: Cell<u32>,
    queue: RefCell<VecDeque<ReplayTask>>,
    drain_requested: Cell<bool>,
    draining: Cell<bool>,
}

impl Coordinator {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            scheduler,
            depth: Cell::new(0),
            queue: RefCell::new(VecDeque::new()),
            drain_requested: Cell::new(false),
            draining: Cell::new(false),
        })
    }

    /// Current blocking-call nesting depth.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Number of replay closures currently queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Enter a synchronous send.
    ///
    /// A new outer call may begin before the previous round's scheduled drain
    /// turn has fired; that older queue must be delivered first or a later
    /// synchronous call would run ahead of older pending signals. The forced
    /// drain here is a no-op in every other situation (nested call, active
    /// drain, nothing requested).
    pub fn begin_synchronous_call(&self) {
        let _ = self.drain_if_requested();

        let depth = self.depth.get() + 1;
        self.depth.set(depth);
        if depth == 1 {
            self.queue.borrow_mut().clear();
            tracing::debug!("blocking window opened");
        } else {
            tracing::debug!(depth, "nested synchronous call; reusing open window");
        }
    }

    /// Leave a synchronous send. Must be called right after the underlying
    /// blocking call returns or errors, on both paths.
    ///
    /// The outermost call schedules its drain for the next turn rather than
    /// draining inline, so the send call fully unwinds (including any raised
    /// error) before older handlers replay. Depth stays at 1 until that
    /// drain runs.
    pub fn end_synchronous_call(&self) {
        if self.depth.get() == 1 {
            self.drain_requested.set(true);
            if let Some(coordinator) = self.this.upgrade() {
                self.scheduler.schedule(Box::new(move || {
                    let _ = coordinator.drain_if_requested();
                }));
            }
            tracing::debug!(pending = self.pending(), "drain scheduled for next turn");
        } else {
            self.depth.set(self.depth.get().saturating_sub(1));
        }
    }

    /// Decide whether a signal may fire immediately.
    ///
    /// Signals of a request classified synchronous are never deferred, at any
    /// depth: the request being waited on must keep reporting progress to its
    /// own handlers in real time. Deferral only protects the blocking call
    /// from *other*, asynchronous, activity.
    #[must_use]
    pub fn admit(&self, request_is_sync: bool) -> Admission {
        if self.depth.get() == 0 || request_is_sync {
            Admission::RunNow
        } else {
            Admission::Queue
        }
    }

    /// Append a replay closure. FIFO, never reordered, never deduplicated.
    pub fn push(&self, task: ReplayTask) {
        self.queue.borrow_mut().push_back(task);
        tracing::trace!(pending = self.pending(), "replay task queued");
    }

    /// Drain the queue if a drain was requested; otherwise a no-op.
    ///
    /// Idempotent per round: the request flag is cleared at drain start, so
    /// the scheduled turn firing after a forced drain already consumed the
    /// queue does nothing. The active-drain guard keeps the pass from ever
    /// running re-entrantly.
    ///
    /// Closures appended while the pass is running (by replayed handlers, or
    /// by a nested synchronous call one of them starts) are picked up in the
    /// same pass: the loop re-checks the queue after every pop.
    ///
    /// Failure policy: a closure returning `Err` is contained per item — the
    /// error is logged and counted, and the remaining items still run.
    pub fn drain_if_requested(&self) -> DrainOutcome {
        if self.draining.get() || !self.drain_requested.replace(false) {
            return DrainOutcome::default();
        }
        self.draining.set(true);

        let mut outcome = DrainOutcome::default();
        loop {
            // Pop outside the borrow: the task may push.
            let task = self.queue.borrow_mut().pop_front();
            let Some(task) = task else { break };
            match task() {
                Ok(()) => outcome.replayed += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(error = %err, "deferred handler failed during replay");
                }
            }
        }

        self.depth.set(self.depth.get().saturating_sub(1));
        self.draining.set(false);
        tracing::debug!(
            replayed = outcome.replayed,
            failed = outcome.failed,
            "blocking window drained"
        );
        outcome
    }
}
