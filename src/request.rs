//! Request wrapper: classification, handler wrapping, and state accessors.
//!
//! [`Request`] decorates a [`HostRequest`] binding. It records whether the
//! request was opened synchronously, brackets synchronous sends with the
//! coordinator's begin/end calls, intercepts every completion-signal
//! dispatch, and overrides the completion-stage and partial-response
//! accessors while a replayed handler's capture is installed.
//!
//! Handler wrapping: both registration surfaces (multi-listener and the
//! single-slot `on*` properties) funnel through [`WrappedHandler`], which
//! reads the live state at invocation time, computes the capture, consults
//! the coordinator, and either runs the original handler immediately or
//! pushes a replay closure that installs the capture, runs the handler, and
//! clears the capture again.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::coordinator::{Admission, Coordinator};
use crate::error::Result;
use crate::host::HostRequest;
use crate::signal::{same_listener, EventListener, ReadyState, SignalEvent, SignalKind};
use crate::snapshot::{Capture, SnapshotSlot};

/// Wrapper around one host request object.
pub struct Request<H: HostRequest> {
    shared: Rc<RequestShared<H>>,
}

struct RequestShared<H: HostRequest> {
    id: u64,
    host: H,
    coordinator: Rc<Coordinator>,
    is_sync: Cell<bool>,
    snapshot: SnapshotSlot,
    listeners: RefCell<Vec<ListenerEntry<H>>>,
    slots: RefCell<HashMap<SignalKind, WrappedHandler<H>>>,
}

struct ListenerEntry<H: HostRequest> {
    kind: SignalKind,
    wrapper: WrappedHandler<H>,
}

/// One generated wrapper around an original user handler.
///
/// Listener-style registration keeps exactly one of these per (signal kind,
/// handler identity), so repeated registration reuses it and removal by the
/// original reference finds it. Slot-style assignment creates a fresh one
/// per assignment.
struct WrappedHandler<H: HostRequest> {
    request: Weak<RequestShared<H>>,
    inner: Rc<dyn EventListener>,
}

impl<H: HostRequest> Clone for WrappedHandler<H> {
    fn clone(&self) -> Self {
        Self {
            request: Weak::clone(&self.request),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: HostRequest + 'static> WrappedHandler<H> {
    /// Intercept one invocation of the wrapped handler.
    fn invoke(&self, event: &SignalEvent) -> Result<()> {
        let Some(shared) = self.request.upgrade() else {
            return Ok(());
        };

        // Live state must be read now, not when the replay eventually runs.
        let stage = shared.host.ready_state();
        let capture = Capture::at_dispatch(stage, shared.host.response_kind(), event, || {
            shared.host.response_text().chars().count()
        });

        match shared.coordinator.admit(shared.is_sync.get()) {
            Admission::RunNow => self.inner.handle_event(event),
            Admission::Queue => {
                tracing::trace!(
                    request = shared.id,
                    signal = event.kind.name(),
                    stage = ?capture.stage,
                    "signal deferred until blocking window closes"
                );
                let inner = Rc::clone(&self.inner);
                let event = event.clone();
                let target = Rc::clone(&shared);
                shared.coordinator.push(Box::new(move || {
                    target.snapshot.install(capture);
                    let result = inner.handle_event(&event);
                    target.snapshot.clear();
                    result
                }));
                Ok(())
            }
        }
    }
}

impl<H: HostRequest + 'static> Request<H> {
    pub(crate) fn new(host: H, coordinator: Rc<Coordinator>, id: u64) -> Self {
        Self {
            shared: Rc::new(RequestShared {
                id,
                host,
                coordinator,
                is_sync: Cell::new(false),
                snapshot: SnapshotSlot::new(),
                listeners: RefCell::new(Vec::new()),
                slots: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Initialize the request, recording its classification first.
    ///
    /// `Some(false)` marks the request synchronous; `None` means the host
    /// default (asynchronous). Classification is purely observational — the
    /// host open is delegated to unchanged.
    pub fn open(&self, method: &str, url: &str, asynchronous: Option<bool>) -> Result<()> {
        let asynchronous = asynchronous.unwrap_or(true);
        self.shared.is_sync.set(!asynchronous);
        self.shared.host.open(method, url, asynchronous)
    }

    /// Perform the request.
    ///
    /// A synchronous send is bracketed by the coordinator: the blocking
    /// window opens before the host call and the drain is scheduled right
    /// after it returns — on the error path too, before the original error
    /// is re-raised to the caller.
    pub fn send(&self, body: Option<&str>) -> Result<()> {
        if !self.shared.is_sync.get() {
            return self.shared.host.send(body);
        }
        self.shared.coordinator.begin_synchronous_call();
        let result = self.shared.host.send(body);
        self.shared.coordinator.end_synchronous_call();
        result
    }

    /// Whether this request was opened synchronously.
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.shared.is_sync.get()
    }

    /// Completion stage: the captured stage while a replayed handler's
    /// capture is installed, the live stage otherwise.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        match self.shared.snapshot.get() {
            Some(capture) => capture.stage,
            None => self.shared.host.ready_state(),
        }
    }

    /// Response text: the captured prefix while a capture with a prefix
    /// length is installed, the live text otherwise. A captured length equal
    /// to the live length returns the full response.
    #[must_use]
    pub fn response_text(&self) -> String {
        let live = self.shared.host.response_text();
        match self.shared.snapshot.get().and_then(|c| c.partial_len) {
            Some(len) if len < live.chars().count() => live.chars().take(len).collect(),
            _ => live,
        }
    }

    /// Register a listener for one signal kind.
    ///
    /// Registering the same handler reference again for the same kind reuses
    /// the existing wrapper: the handler will not fire twice for one signal,
    /// and a single removal fully unregisters it.
    pub fn add_listener(&self, kind: SignalKind, handler: Rc<dyn EventListener>) {
        let mut listeners = self.shared.listeners.borrow_mut();
        if listeners
            .iter()
            .any(|entry| entry.kind == kind && same_listener(&entry.wrapper.inner, &handler))
        {
            return;
        }
        listeners.push(ListenerEntry {
            kind,
            wrapper: WrappedHandler {
                request: Rc::downgrade(&self.shared),
                inner: handler,
            },
        });
    }

    /// Remove a listener by its original handler reference. Removing a
    /// handler that was never registered is a silent no-op.
    pub fn remove_listener(&self, kind: SignalKind, handler: &Rc<dyn EventListener>) {
        self.shared
            .listeners
            .borrow_mut()
            .retain(|entry| !(entry.kind == kind && same_listener(&entry.wrapper.inner, handler)));
    }

    /// Assign the single-slot handler for one signal kind (the `on*`
    /// property). Each assignment replaces the previous handler wholesale
    /// through a freshly wrapped version; `None` clears the slot.
    pub fn set_handler(&self, kind: SignalKind, handler: Option<Rc<dyn EventListener>>) {
        let mut slots = self.shared.slots.borrow_mut();
        match handler {
            Some(inner) => {
                slots.insert(
                    kind,
                    WrappedHandler {
                        request: Rc::downgrade(&self.shared),
                        inner,
                    },
                );
            }
            None => {
                slots.remove(&kind);
            }
        }
    }

    /// Read back the single-slot handler: the last assigned *original*
    /// handler, never the wrapper.
    #[must_use]
    pub fn handler(&self, kind: SignalKind) -> Option<Rc<dyn EventListener>> {
        self.shared
            .slots
            .borrow()
            .get(&kind)
            .map(|wrapper| Rc::clone(&wrapper.inner))
    }

    /// Host-facing delivery entry: dispatch one completion signal to every
    /// wrapped handler registered for its kind — listeners in registration
    /// order, then the slot handler.
    ///
    /// All handlers run even if one fails; the first error is returned after
    /// the rest have had their turn.
    pub fn dispatch(&self, event: &SignalEvent) -> Result<()> {
        // Snapshot the target list first so handlers may register or remove
        // listeners without tripping a borrow.
        let targets: Vec<WrappedHandler<H>> = {
            let listeners = self.shared.listeners.borrow();
            let mut targets: Vec<WrappedHandler<H>> = listeners
                .iter()
                .filter(|entry| entry.kind == event.kind)
                .map(|entry| entry.wrapper.clone())
                .collect();
            if let Some(slot) = self.shared.slots.borrow().get(&event.kind) {
                targets.push(slot.clone());
            }
            targets
        };

        let mut first_err = None;
        for wrapper in targets {
            if let Err(err) = wrapper.invoke(event) {
                tracing::warn!(
                    request = self.shared.id,
                    signal = event.kind.name(),
                    error = %err,
                    "signal handler failed"
                );
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Access the wrapped host binding.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.shared.host
    }
}

/// Cloning shares the wrapper state; host-side code clones a handle to
/// dispatch into the wrapper from inside a blocking send.
impl<H: HostRequest> Clone for Request<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}
