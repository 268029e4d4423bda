//! Typed completion-signal definitions.
//!
//! A *completion signal* is any lifecycle notification a request can emit:
//! state change, progress, load, error, abort, timeout. Signals are dispatched
//! to registered [`EventListener`]s through the request wrapper, which decides
//! per signal whether delivery happens now or is deferred until the current
//! blocking window closes.

use std::rc::Rc;

use crate::error::Result;

/// Completion stage of a request, mirroring the host's 0..=4 numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

impl ReadyState {
    /// Whether this stage can have received any body data yet.
    #[must_use]
    pub const fn has_body_data(self) -> bool {
        matches!(self, Self::Loading | Self::Done)
    }
}

/// Shape of a request's response, as far as partial-state capture cares:
/// only text-shaped responses get a captured prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Binary,
}

/// The fixed set of completion-signal types a request exposes, one per
/// single-slot `on*` handler property on the host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Abort,
    Error,
    Load,
    LoadEnd,
    LoadStart,
    Progress,
    ReadyStateChange,
    Timeout,
}

impl SignalKind {
    /// All signal kinds, in host property order.
    pub const ALL: [Self; 8] = [
        Self::Abort,
        Self::Error,
        Self::Load,
        Self::LoadEnd,
        Self::LoadStart,
        Self::Progress,
        Self::ReadyStateChange,
        Self::Timeout,
    ];

    /// The host-side event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Error => "error",
            Self::Load => "load",
            Self::LoadEnd => "loadend",
            Self::LoadStart => "loadstart",
            Self::Progress => "progress",
            Self::ReadyStateChange => "readystatechange",
            Self::Timeout => "timeout",
        }
    }
}

/// Event-style dispatch arguments for one completion signal.
///
/// `loaded` is the progress measurement carried by progress-type signals;
/// most other signals leave it unset and the capture logic falls back to the
/// live response length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    pub kind: SignalKind,
    pub loaded: Option<u64>,
    pub total: Option<u64>,
}

impl SignalEvent {
    #[must_use]
    pub const fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            loaded: None,
            total: None,
        }
    }

    /// A progress-type event carrying a byte measurement.
    #[must_use]
    pub const fn progress(kind: SignalKind, loaded: u64) -> Self {
        Self {
            kind,
            loaded: Some(loaded),
            total: None,
        }
    }
}

/// A completion handler supplied by application code.
///
/// Both handler shapes the host accepts funnel through this trait: plain
/// callables (via the blanket impl below) and handler objects that expose a
/// "handle this event" method (by implementing the trait directly).
pub trait EventListener {
    fn handle_event(&self, event: &SignalEvent) -> Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&SignalEvent) -> Result<()>,
{
    fn handle_event(&self, event: &SignalEvent) -> Result<()> {
        self(event)
    }
}

/// Identity comparison for registered handlers.
///
/// Registration and removal work by handler reference; two `Rc`s are the
/// same handler iff they share a data pointer. The vtable half of the fat
/// pointer is deliberately ignored.
pub(crate) fn same_listener(a: &Rc<dyn EventListener>, b: &Rc<dyn EventListener>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a).cast::<u8>(),
        Rc::as_ptr(b).cast::<u8>(),
    )
}
