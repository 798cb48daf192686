use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll, Waker},
};

use antidote::Mutex;

pub(crate) const CLOSED: usize = usize::MAX;

/// A single-value, single-reader watch channel used to signal the body
/// sender when the dispatch task wants more data.
pub(crate) fn channel() -> (Sender, Receiver) {
    let shared = Arc::new(Shared {
        value: AtomicUsize::new(0),
        waker: Mutex::new(None),
    });
    (
        Sender {
            shared: shared.clone(),
        },
        Receiver { shared },
    )
}

struct Shared {
    value: AtomicUsize,
    waker: Mutex<Option<Waker>>,
}

#[derive(Clone)]
pub(crate) struct Sender {
    shared: Arc<Shared>,
}

pub(crate) struct Receiver {
    shared: Arc<Shared>,
}

impl Sender {
    pub(crate) fn send(&self, value: usize) {
        self.shared.value.store(value, Ordering::SeqCst);
        if let Some(waker) = self.shared.waker.lock().take() {
            waker.wake();
        }
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.send(CLOSED);
    }
}

impl Receiver {
    pub(crate) fn load(&mut self, cx: &mut Context<'_>) -> usize {
        *self.shared.waker.lock() = Some(cx.waker().clone());
        self.shared.value.load(Ordering::SeqCst)
    }
}

// kept for parity with real watch channels that expose a `poll`-style API
#[allow(dead_code)]
pub(crate) fn poll_noop(_cx: &mut Context<'_>) -> Poll<()> {
    Poll::Pending
}
