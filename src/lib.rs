//! syncgate: event deferral and ordered replay around blocking network calls.
//!
//! Some host engines let asynchronous completion signals and cross-context
//! messages interleave with a synchronous (blocking) network request; others
//! defer them until the blocking call has returned. This crate implements
//! the deferring behavior as an explicit wrapper layer so an embedding host
//! can offer the stricter ordering guarantee uniformly:
//!
//! - [`request::Request`] decorates a host request binding: it classifies
//!   the request as synchronous or asynchronous at open time, brackets
//!   synchronous sends, wraps every completion handler, and substitutes
//!   captured state for live state while a deferred handler replays.
//! - [`message::MessagePort`] decorates the cross-context message send
//!   entry point: delivery is always one scheduling turn late, and queued
//!   behind deferred signals whenever a blocking window is open.
//! - [`coordinator::Coordinator`] owns the blocking depth, the FIFO replay
//!   queue, and the drain logic with its ordering invariants.
//! - [`session::Session`] composes the above once per page-equivalent
//!   lifetime, gated on a [`host::FeatureProbe`] that reports whether the
//!   host needs the patch at all.
//!
//! The engine never changes a request's outcome and never reorders
//! asynchronous work among itself — it only keeps that work from running
//! *during* a synchronous call, then replays it in capture order.
//!
//! Execution model: single-threaded and cooperative. The embedding host
//! pumps [`session::Session::tick`] between macro-level events; nothing
//! here is `Send` and nothing takes a lock.

pub mod coordinator;
pub mod error;
pub mod host;
pub mod message;
pub mod request;
pub mod scheduler;
pub mod session;
pub mod signal;
pub mod snapshot;

pub use coordinator::{Admission, Coordinator, DrainOutcome};
pub use error::{Error, Result};
pub use host::{probe_open_outcome, FeatureProbe, HostMessagePort, HostRequest};
pub use message::{MessagePayload, MessagePort};
pub use request::Request;
pub use scheduler::{Scheduler, TurnQueue};
pub use session::Session;
pub use signal::{EventListener, ReadyState, ResponseKind, SignalEvent, SignalKind};
pub use snapshot::Capture;
