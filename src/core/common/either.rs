use std::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::core::rt::{Read, ReadBufCursor, Write};

/// Combine two different futures, streams, or I/O transports that have the same associated types
/// into a single concrete type.
///
/// This is a (very) stripped down version of the `either` crate, scoped to
/// just the IO bound needed to pick between a plain TCP connection and an
/// upgraded / boxed one at the call site.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Either<A, B> {
    A(A),
    B(B),
}

impl<A, B> Read for Either<A, B>
where
    A: Read,
    B: Read,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Either::A(a) => Pin::new(a).poll_read(cx, buf),
            Either::B(b) => Pin::new(b).poll_read(cx, buf),
        }
    }
}

impl<A, B> Write for Either<A, B>
where
    A: Write,
    B: Write,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Either::A(a) => Pin::new(a).poll_write(cx, buf),
            Either::B(b) => Pin::new(b).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Either::A(a) => Pin::new(a).poll_flush(cx),
            Either::B(b) => Pin::new(b).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Either::A(a) => Pin::new(a).poll_shutdown(cx),
            Either::B(b) => Pin::new(b).poll_shutdown(cx),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match self {
            Either::A(a) => a.is_write_vectored(),
            Either::B(b) => b.is_write_vectored(),
        }
    }
}
