//! Common test infrastructure for syncgate integration tests.
//!
//! Provides scriptable fake host bindings:
//! - [`FakeRequest`] — a host request whose state is driven from the test,
//!   with an on-send hook for simulating signals that arrive while a
//!   blocking send is in flight
//! - [`FakePort`] — a host message port recording every delivery
//! - journal-backed listeners for asserting delivery order and captured
//!   state

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use syncgate::{
    Error, EventListener, HostMessagePort, HostRequest, MessagePayload, ReadyState, Request,
    ResponseKind, Result, SignalEvent,
};

/// Shared ordered log of string tags.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Initialize tracing output for tests, honoring `RUST_LOG`. Idempotent.
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Test-controlled state behind a [`FakeRequest`].
pub struct FakeRequestState {
    pub ready_state: Cell<ReadyState>,
    pub response: RefCell<String>,
    pub response_kind: Cell<ResponseKind>,
    pub fail_send: Cell<bool>,
    pub sends: Cell<u32>,
    pub opened: RefCell<Option<(String, String, bool)>>,
    pub on_send: RefCell<Option<Box<dyn Fn()>>>,
}

impl FakeRequestState {
    pub fn set_response(&self, stage: ReadyState, text: &str) {
        self.ready_state.set(stage);
        *self.response.borrow_mut() = text.to_string();
    }
}

/// Scriptable host request binding.
pub struct FakeRequest {
    state: Rc<FakeRequestState>,
}

impl FakeRequest {
    pub fn new() -> (Self, Rc<FakeRequestState>) {
        init_logging();
        let state = Rc::new(FakeRequestState {
            ready_state: Cell::new(ReadyState::Unsent),
            response: RefCell::new(String::new()),
            response_kind: Cell::new(ResponseKind::Text),
            fail_send: Cell::new(false),
            sends: Cell::new(0),
            opened: RefCell::new(None),
            on_send: RefCell::new(None),
        });
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl HostRequest for FakeRequest {
    fn open(&self, method: &str, url: &str, asynchronous: bool) -> Result<()> {
        *self.state.opened.borrow_mut() = Some((method.to_string(), url.to_string(), asynchronous));
        self.state.ready_state.set(ReadyState::Opened);
        Ok(())
    }

    fn send(&self, _body: Option<&str>) -> Result<()> {
        self.state.sends.set(self.state.sends.get() + 1);
        {
            let hook = self.state.on_send.borrow();
            if let Some(hook) = hook.as_ref() {
                hook();
            }
        }
        if self.state.fail_send.get() {
            return Err(Error::request("network failure"));
        }
        self.state.ready_state.set(ReadyState::Done);
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state.ready_state.get()
    }

    fn response_kind(&self) -> ResponseKind {
        self.state.response_kind.get()
    }

    fn response_text(&self) -> String {
        self.state.response.borrow().clone()
    }
}

/// Host message port recording every delivered payload, optionally tagging a
/// shared journal so delivery order can be asserted against signal handlers.
pub struct FakePort {
    delivered: Rc<RefCell<Vec<MessagePayload>>>,
    journal: Option<Journal>,
}

impl FakePort {
    pub fn new() -> (Self, Rc<RefCell<Vec<MessagePayload>>>) {
        init_logging();
        let delivered = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                delivered: Rc::clone(&delivered),
                journal: None,
            },
            delivered,
        )
    }

    pub fn with_journal(journal: &Journal) -> (Self, Rc<RefCell<Vec<MessagePayload>>>) {
        let (mut port, delivered) = Self::new();
        port.journal = Some(Rc::clone(journal));
        (port, delivered)
    }
}

impl HostMessagePort for FakePort {
    fn deliver(&self, payload: &MessagePayload) -> Result<()> {
        self.delivered.borrow_mut().push(payload.clone());
        if let Some(journal) = &self.journal {
            journal
                .borrow_mut()
                .push(format!("message:{}", payload.data));
        }
        Ok(())
    }
}

/// Listener pushing `"{tag}:{signal}"` onto the journal.
pub fn tagging_listener(journal: &Journal, tag: &str) -> Rc<dyn EventListener> {
    let journal = Rc::clone(journal);
    let tag = tag.to_string();
    Rc::new(move |event: &SignalEvent| {
        journal
            .borrow_mut()
            .push(format!("{tag}:{}", event.kind.name()));
        Ok(())
    })
}

/// Listener recording what the wrapper's state accessors report at handler
/// time — the captured view during replay, the live view otherwise.
pub fn observing_listener<H: HostRequest + 'static>(
    request: &Request<H>,
    observations: &Rc<RefCell<Vec<(ReadyState, String)>>>,
) -> Rc<dyn EventListener> {
    let request = request.clone();
    let observations = Rc::clone(observations);
    Rc::new(move |_: &SignalEvent| {
        observations
            .borrow_mut()
            .push((request.ready_state(), request.response_text()));
        Ok(())
    })
}
