//! Host-binding seams.
//!
//! The engine never owns the real request or messaging objects; it wraps
//! them. These traits are the full surface it needs from the host, chosen at
//! the composition boundary where a [`crate::session::Session`] wraps a host
//! binding into a [`crate::request::Request`] or
//! [`crate::message::MessagePort`].
//!
//! All methods take `&self`: during a blocking send the host re-enters the
//! wrapper layer to dispatch signals, so host implementations use interior
//! mutability rather than `&mut` receivers.

use crate::error::Result;
use crate::message::MessagePayload;
use crate::signal::{ReadyState, ResponseKind};

/// The underlying network request object, owned by the host environment.
pub trait HostRequest {
    /// Initialize the request. `asynchronous = false` is a blocking request;
    /// the wrapper records the classification before delegating here.
    fn open(&self, method: &str, url: &str, asynchronous: bool) -> Result<()>;

    /// Perform the request. For a request opened synchronously this call
    /// genuinely blocks until completion, by host contract; the engine does
    /// not change that, only what happens to other signals meanwhile.
    fn send(&self, body: Option<&str>) -> Result<()>;

    /// Live completion stage.
    fn ready_state(&self) -> ReadyState;

    /// Whether the response is text-shaped.
    fn response_kind(&self) -> ResponseKind;

    /// Live response text received so far.
    fn response_text(&self) -> String;
}

/// The cross-context message send entry point.
pub trait HostMessagePort {
    /// Deliver one message with its original arguments. Called either one
    /// turn after `post_message` (no blocking window open) or during a later
    /// drain (window was open); never both.
    fn deliver(&self, payload: &MessagePayload) -> Result<()>;
}

/// Feature-detection collaborator: does this host interleave async signals
/// with synchronous calls, so that the deferral patch is required at all?
///
/// Implementations that probe by issuing a real request must report `false`
/// when the probe open itself fails because the host cannot perform this
/// class of request at all — incapability means there is nothing to patch,
/// and the failure must not propagate. [`probe_open_outcome`] encodes that
/// rule.
pub trait FeatureProbe {
    fn deferral_required(&self) -> bool;
}

impl<F> FeatureProbe for F
where
    F: Fn() -> bool,
{
    fn deferral_required(&self) -> bool {
        self()
    }
}

/// Map the result of a probe request to the probe verdict: an error opening
/// the probe request means "not required", never a propagated failure.
#[must_use]
pub fn probe_open_outcome(result: Result<bool>) -> bool {
    result.unwrap_or(false)
}
