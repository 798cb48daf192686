//! Asynchronous IO traits.
//!
//! These traits are a subset of `tokio::io::{AsyncRead, AsyncWrite}`, adapted
//! to expose an uninitialized read buffer cursor so implementations can avoid
//! zeroing memory before a read. [`TokioIo`](super::TokioIo) bridges these
//! traits to the `tokio::io` equivalents.
use std::{
    mem::MaybeUninit,
    pin::Pin,
    task::{Context, Poll},
};

/// Reads bytes from a source.
pub trait Read {
    /// Attempts to read data into `buf`.
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<std::io::Result<()>>;
}

/// Writes bytes to a sink.
pub trait Write {
    /// Attempt to write bytes from `buf` into the destination.
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>>;

    /// Attempt to write bytes from `bufs` into the destination.
    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[std::io::IoSlice<'_>],
    ) -> Poll<std::io::Result<usize>> {
        if let Some(first) = bufs.iter().find(|b| !b.is_empty()) {
            self.poll_write(cx, first)
        } else {
            Poll::Ready(Ok(0))
        }
    }

    /// Returns whether this writer has an efficient `poll_write_vectored` implementation.
    fn is_write_vectored(&self) -> bool {
        false
    }

    /// Attempts to flush the output stream.
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>>;

    /// Attempts to shut down this writer.
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>>;
}

/// A borrowed, uninitialized-friendly handle to read into.
///
/// Unlike `tokio::io::ReadBuf`, this type is constructed around a slice of
/// `MaybeUninit<u8>` so a `Read` impl backed by, say, a `Vec<u8>` with spare
/// capacity can write directly into it without a zeroing pass.
#[derive(Debug)]
pub struct ReadBuf<'a> {
    buf: &'a mut [MaybeUninit<u8>],
    filled: usize,
    init: usize,
}

/// A cursor over a [`ReadBuf`], handed to [`Read::poll_read`] implementations.
#[derive(Debug)]
pub struct ReadBufCursor<'a> {
    buf: &'a mut ReadBuf<'a>,
}

impl<'a> ReadBuf<'a> {
    /// Creates a new `ReadBuf` wrapping the given uninitialized buffer.
    pub fn uninit(buf: &'a mut [MaybeUninit<u8>]) -> ReadBuf<'a> {
        ReadBuf {
            buf,
            filled: 0,
            init: 0,
        }
    }

    /// Creates a new `ReadBuf` wrapping a fully initialized buffer.
    pub fn new(buf: &'a mut [u8]) -> ReadBuf<'a> {
        let len = buf.len();
        // SAFETY: `u8` and `MaybeUninit<u8>` have identical layout, and the
        // buffer is already initialized.
        let buf =
            unsafe { std::slice::from_raw_parts_mut(buf.as_mut_ptr().cast(), len) };
        ReadBuf {
            buf,
            filled: 0,
            init: len,
        }
    }

    /// Returns a shared reference to the filled portion of the buffer.
    #[inline]
    pub fn filled(&self) -> &[u8] {
        // SAFETY: filled bytes are always initialized.
        unsafe { std::slice::from_raw_parts(self.buf.as_ptr().cast(), self.filled) }
    }

    /// Returns the number of bytes at the end of the slice that have not yet
    /// been filled.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.filled
    }

    /// Returns a cursor over the unfilled part of the buffer.
    #[inline]
    pub fn unfilled<'b>(&'b mut self) -> ReadBufCursor<'b> {
        ReadBufCursor {
            // SAFETY: the cursor's lifetime is tied back to `self`'s via the
            // explicit lifetime parameter; this mirrors tokio's own cursor.
            buf: unsafe { std::mem::transmute::<&'b mut ReadBuf<'a>, &'b mut ReadBuf<'b>>(self) },
        }
    }

    #[inline]
    fn initialize_unfilled(&mut self) {
        let unfilled = self.buf.len() - self.init;
        if unfilled == 0 {
            return;
        }
        // SAFETY: we zero exactly the uninitialized suffix and mark it init.
        unsafe {
            let ptr = self.buf.as_mut_ptr().add(self.init).cast::<u8>();
            std::ptr::write_bytes(ptr, 0, unfilled);
        }
        self.init = self.buf.len();
    }
}

impl<'a> ReadBufCursor<'a> {
    /// Returns the number of bytes remaining to be written to.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns a mutable pointer to the unfilled, possibly-uninitialized part
    /// of the buffer.
    #[inline]
    pub fn as_mut(&mut self) -> &mut [MaybeUninit<u8>] {
        &mut self.buf.buf[self.buf.filled..]
    }

    /// Advances the filled cursor by `n` bytes, asserting they've been
    /// initialized by the caller.
    ///
    /// # Safety
    ///
    /// The caller must have actually written `n` initialized bytes into the
    /// slice returned by [`Self::as_mut`].
    #[inline]
    pub unsafe fn advance(&mut self, n: usize) {
        let new_filled = self.buf.filled + n;
        self.buf.init = self.buf.init.max(new_filled);
        self.buf.filled = new_filled;
    }

    /// Appends initialized bytes into the buffer, advancing the filled
    /// cursor.
    #[inline]
    pub fn put_slice(&mut self, bytes: &[u8]) {
        assert!(
            self.buf.remaining() >= bytes.len(),
            "buffer has insufficient capacity"
        );
        let amt = bytes.len();
        // SAFETY: just copied `amt` initialized bytes in.
        unsafe {
            let dst = self.as_mut();
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.as_mut_ptr().cast(), amt);
            self.advance(amt);
        }
    }

    /// Ensures the unfilled portion is initialized and returns it.
    #[inline]
    pub fn ensure_init(&mut self) -> &mut [u8] {
        self.buf.initialize_unfilled();
        let slice = &mut self.buf.buf[self.buf.filled..];
        // SAFETY: just initialized.
        unsafe { std::slice::from_raw_parts_mut(slice.as_mut_ptr().cast(), slice.len()) }
    }
}

pub(crate) async fn read<T>(io: &mut T, buf: &mut [u8]) -> std::io::Result<usize>
where
    T: Read + Unpin,
{
    std::future::poll_fn(move |cx| {
        let mut read_buf = ReadBuf::new(buf);
        match Pin::new(&mut *io).poll_read(cx, read_buf.unfilled()) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(read_buf.filled().len())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    })
    .await
}

pub(crate) async fn write_all<T>(io: &mut T, mut buf: &[u8]) -> std::io::Result<()>
where
    T: Write + Unpin,
{
    while !buf.is_empty() {
        let n = std::future::poll_fn(|cx| Pin::new(&mut *io).poll_write(cx, buf)).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write zero byte into writer",
            ));
        }
        buf = &buf[n..];
    }
    Ok(())
}
