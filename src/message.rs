//! Cross-context message deferral.
//!
//! Every outbound message is delayed by one scheduling turn unconditionally,
//! matching the ordering baseline of hosts where cross-context delivery is
//! never same-turn. When the turn arrives the coordinator is consulted: no
//! blocking window open means immediate delivery with the original payload;
//! an open window means the delivery is queued alongside deferred completion
//! signals and replays in the same FIFO pass. Delivery is exactly-once,
//! either path, never both.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::coordinator::Coordinator;
use crate::host::HostMessagePort;
use crate::scheduler::Scheduler;

/// One cross-context message: structured-clone data plus the sending
/// context's origin, both preserved verbatim until delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl MessagePayload {
    #[must_use]
    pub const fn new(data: serde_json::Value) -> Self {
        Self { data, origin: None }
    }

    #[must_use]
    pub fn with_origin(data: serde_json::Value, origin: impl Into<String>) -> Self {
        Self {
            data,
            origin: Some(origin.into()),
        }
    }
}

/// Wrapper around one host message port.
pub struct MessagePort<P: HostMessagePort> {
    shared: Rc<PortShared<P>>,
}

struct PortShared<P: HostMessagePort> {
    host: P,
    coordinator: Rc<Coordinator>,
    scheduler: Rc<dyn Scheduler>,
}

impl<P: HostMessagePort + 'static> MessagePort<P> {
    pub(crate) fn new(host: P, coordinator: Rc<Coordinator>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            shared: Rc::new(PortShared {
                host,
                coordinator,
                scheduler,
            }),
        }
    }

    /// Send one message. Fire-and-forget from the caller's point of view;
    /// a failing host delivery is logged, not surfaced.
    pub fn post_message(&self, payload: MessagePayload) {
        let shared = Rc::clone(&self.shared);
        self.shared.scheduler.schedule(Box::new(move || {
            if shared.coordinator.depth() == 0 {
                deliver(&shared, &payload);
            } else {
                tracing::trace!("message deferred until blocking window closes");
                let target = Rc::clone(&shared);
                shared.coordinator.push(Box::new(move || {
                    target.host.deliver(&payload)
                }));
            }
        }));
    }

    /// Access the wrapped host port.
    #[must_use]
    pub fn host(&self) -> &P {
        &self.shared.host
    }
}

fn deliver<P: HostMessagePort>(shared: &PortShared<P>, payload: &MessagePayload) {
    if let Err(err) = shared.host.deliver(payload) {
        tracing::warn!(error = %err, "cross-context message delivery failed");
    }
}

impl<P: HostMessagePort> Clone for MessagePort<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}
