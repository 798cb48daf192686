use std::{
    future::Future,
    mem,
    pin::Pin,
    task::{Context, Poll},
};

pub(crate) trait Started: Future {
    fn started(&self) -> bool;
}

pub(crate) fn lazy<F, R>(func: F) -> Lazy<F, R>
where
    F: FnOnce() -> R,
    R: Future,
{
    Lazy {
        inner: Inner::Init(func),
    }
}

// Use a private struct (`Inner`) wrapped in a public struct to hide the fact
// that we're using an `Either`-like state machine internally.
pub(crate) struct Lazy<F, R> {
    inner: Inner<F, R>,
}

enum Inner<F, R> {
    Init(F),
    Fut(R),
    Empty,
}

impl<F, R> Future for Lazy<F, R>
where
    F: FnOnce() -> R,
    R: Future,
{
    type Output = R::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: we never move anything out of `self` other than the
        // replaced `Inner::Init` closure, and `R` isn't guaranteed `Unpin`,
        // so we only ever touch the inner future behind its own pin.
        unsafe {
            let me = self.get_unchecked_mut();
            loop {
                match mem::replace(&mut me.inner, Inner::Empty) {
                    Inner::Init(func) => {
                        me.inner = Inner::Fut(func());
                    }
                    Inner::Fut(mut fut) => {
                        let pin = Pin::new_unchecked(&mut fut);
                        let poll = pin.poll(cx);
                        if poll.is_pending() {
                            me.inner = Inner::Fut(fut);
                        }
                        return poll;
                    }
                    Inner::Empty => panic!("polled after complete"),
                }
            }
        }
    }
}

impl<F, R> Started for Lazy<F, R>
where
    F: FnOnce() -> R,
    R: Future,
{
    fn started(&self) -> bool {
        !matches!(self.inner, Inner::Init(_))
    }
}
