//! Session wiring: one coordinator, one turn queue, probe-gated install.
//!
//! A [`Session`] is created once per page-equivalent lifetime. It owns the
//! [`Coordinator`] and the [`TurnQueue`] and hands shared references to
//! every wrapper it constructs, so all requests and message ports in the
//! session observe the same blocking windows and the same replay queue.

use std::cell::Cell;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::host::{FeatureProbe, HostMessagePort, HostRequest};
use crate::message::MessagePort;
use crate::request::Request;
use crate::scheduler::{Scheduler, TurnQueue};

pub struct Session {
    coordinator: Rc<Coordinator>,
    turns: Rc<TurnQueue>,
    next_request_id: Cell<u64>,
}

impl Session {
    /// Create a session unconditionally, for embedders that already know the
    /// host needs the patch.
    #[must_use]
    pub fn new() -> Rc<Self> {
        let turns = Rc::new(TurnQueue::new());
        let coordinator = Coordinator::new(Rc::clone(&turns) as Rc<dyn Scheduler>);
        Rc::new(Self {
            coordinator,
            turns,
            next_request_id: Cell::new(1),
        })
    }

    /// Probe-gated install: `None` when the host already provides the
    /// ordering guarantee natively (or cannot perform this class of request
    /// at all), in which case application code uses the host bindings
    /// directly and unwrapped.
    #[must_use]
    pub fn install(probe: &dyn FeatureProbe) -> Option<Rc<Self>> {
        if !probe.deferral_required() {
            tracing::debug!("host orders signals natively; deferral patch not installed");
            return None;
        }
        tracing::debug!("deferral patch installed");
        Some(Self::new())
    }

    /// Wrap a host request binding into this session.
    pub fn wrap_request<H: HostRequest + 'static>(&self, host: H) -> Request<H> {
        let id = self.next_request_id.get();
        self.next_request_id.set(id + 1);
        Request::new(host, Rc::clone(&self.coordinator), id)
    }

    /// Wrap a host message port into this session.
    pub fn wrap_port<P: HostMessagePort + 'static>(&self, host: P) -> MessagePort<P> {
        MessagePort::new(
            host,
            Rc::clone(&self.coordinator),
            Rc::clone(&self.turns) as Rc<dyn Scheduler>,
        )
    }

    /// The shared blocking coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Rc<Coordinator> {
        &self.coordinator
    }

    /// Run one scheduling turn. The embedding host pumps this between
    /// macro-level events; scheduled drains and message deferrals fire here.
    pub fn tick(&self) -> usize {
        self.turns.tick()
    }

    /// Run turns until no scheduled work remains.
    pub fn run_until_idle(&self) -> usize {
        self.turns.run_until_idle()
    }

    /// Whether any scheduled work is pending a turn.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.turns.is_idle()
    }
}
