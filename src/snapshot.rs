//! Point-in-time request state captures.
//!
//! When a signal is deferred, the state its handler would have observed is
//! recorded as a [`Capture`]. The capture is installed into the request's
//! [`SnapshotSlot`] immediately before the deferred handler replays and
//! cleared immediately after it returns; while installed, the request's
//! state accessors report the captured values instead of live ones. Install
//! and clear are strictly paired per replayed handler call — a capture is
//! never shared across two queued handlers, and outside active replay the
//! slot is empty.

use std::cell::Cell;

use crate::signal::{ReadyState, ResponseKind, SignalEvent};

/// Snapshot of a request's completion stage and, for text-shaped responses,
/// the prefix length of its response known at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub stage: ReadyState,
    pub partial_len: Option<usize>,
}

impl Capture {
    /// Compute the capture for one signal dispatch from the request's live
    /// state at invocation time.
    ///
    /// The prefix length is only meaningful for text-shaped responses. If
    /// the request has not begun receiving body data the prefix is empty; a
    /// progress measurement on the event takes precedence over the live
    /// response length, which is only read as a last resort.
    pub fn at_dispatch(
        stage: ReadyState,
        response_kind: ResponseKind,
        event: &SignalEvent,
        live_len: impl FnOnce() -> usize,
    ) -> Self {
        let partial_len = match response_kind {
            ResponseKind::Binary => None,
            ResponseKind::Text => Some(if !stage.has_body_data() {
                0
            } else if let Some(loaded) = event.loaded {
                usize::try_from(loaded).unwrap_or(usize::MAX)
            } else {
                live_len()
            }),
        };
        Self { stage, partial_len }
    }
}

/// Per-request holder for the currently-installed capture, if any.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    current: Cell<Option<Capture>>,
}

impl SnapshotSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, capture: Capture) {
        self.current.set(Some(capture));
    }

    pub fn clear(&self) {
        self.current.set(None);
    }

    #[must_use]
    pub fn get(&self) -> Option<Capture> {
        self.current.get()
    }
}
