//! Streaming bodies for HTTP Requests and Responses
//!
//! To send a request with a body, use the [`Body`] trait.
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use super::proto::h2::ping;

/// A stream of `Bytes`, used when receiving bodies from the network.
///
/// Note that empty chunks of `Bytes` are normalized out, and will not
/// be produced.
pub struct Incoming {
    kind: Kind,
}

enum Kind {
    Empty,
    Chan {
        content_length: DecodedLength,
        want_tx: crate::core::common::watch::Sender,
        rx: crate::core::client::dispatch::Receiver<Bytes, ()>,
    },
    H2 {
        content_length: DecodedLength,
        data_done: bool,
        ping: ping::Recorder,
        recv: h2_imp::RecvStream,
    },
}

mod h2_imp {
    pub(crate) use h2::RecvStream;
}

/// A sender half created through [`Body::channel()`].
///
/// Useful when wanting to stream chunks from another thread.
#[must_use = "Sender does nothing unless sent on"]
pub(crate) struct Sender {
    want_rx: crate::core::common::watch::Receiver,
    tx: crate::core::client::dispatch::Sender<Bytes, ()>,
}

const WANT_PENDING: usize = 1;
const WANT_READY: usize = 2;

impl Incoming {
    /// Create a `Body` stream with an associated sender half.
    ///
    /// Useful when wanting to stream chunks from another thread.
    #[allow(unused)]
    pub(crate) fn channel() -> (Sender, Incoming) {
        Self::new_channel(DecodedLength::CHUNKED, /*wanter =*/ false)
    }

    pub(crate) fn new_channel(content_length: DecodedLength, wanter: bool) -> (Sender, Incoming) {
        let (tx, rx) = crate::core::client::dispatch::channel();
        let (want_tx, want_rx) = crate::core::common::watch::channel();

        if !wanter {
            want_tx.send(WANT_READY);
        }

        let tx = Sender { want_rx, tx };
        let rx = Incoming {
            kind: Kind::Chan {
                content_length,
                want_tx,
                rx,
            },
        };

        (tx, rx)
    }

    #[must_use]
    pub(crate) fn empty() -> Incoming {
        Incoming { kind: Kind::Empty }
    }

    pub(crate) fn h2(
        recv: h2::RecvStream,
        content_length: DecodedLength,
        ping: ping::Recorder,
    ) -> Incoming {
        Incoming {
            kind: Kind::H2 {
                content_length,
                data_done: false,
                ping,
                recv,
            },
        }
    }

    fn poll_inner(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<crate::core::Result<Frame<Bytes>>>> {
        match self.kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Chan {
                content_length: ref mut len,
                ref mut want_tx,
                ref mut rx,
            } => {
                want_tx.send(WANT_READY);

                match std::task::ready!(Pin::new(rx).poll_recv(cx)) {
                    Some(Ok(chunk)) => {
                        len.sub_if(chunk.len() as u64);
                        Poll::Ready(Some(Ok(Frame::data(chunk))))
                    }
                    Some(Err(e)) => Poll::Ready(Some(Err(e))),
                    None => Poll::Ready(None),
                }
            }
            Kind::H2 {
                ref mut data_done,
                ref ping,
                content_length: ref mut len,
                ref mut recv,
            } => {
                if *data_done {
                    return Poll::Ready(None);
                }
                match std::task::ready!(recv.poll_data(cx)) {
                    Some(Ok(bytes)) => {
                        let _ = recv.flow_control().release_capacity(bytes.len());
                        len.sub_if(bytes.len() as u64);
                        ping.record_data(bytes.len());
                        Poll::Ready(Some(Ok(Frame::data(bytes))))
                    }
                    Some(Err(e)) => Poll::Ready(Some(Err(crate::core::Error::new_body(e)))),
                    None => {
                        *data_done = true;
                        // Are there trailers?
                        match std::task::ready!(recv.poll_trailers(cx)) {
                            Ok(Some(trailers)) => Poll::Ready(Some(Ok(Frame::trailers(trailers)))),
                            Ok(None) => Poll::Ready(None),
                            Err(e) => Poll::Ready(Some(Err(crate::core::Error::new_body(e)))),
                        }
                    }
                }
            }
        }
    }
}

impl HttpBody for Incoming {
    type Data = Bytes;
    type Error = crate::core::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut().poll_inner(cx)
    }

    fn is_end_stream(&self) -> bool {
        match self.kind {
            Kind::Empty => true,
            Kind::Chan { content_length, .. } => content_length == DecodedLength::ZERO,
            Kind::H2 {
                data_done,
                content_length,
                ..
            } => data_done || content_length == DecodedLength::ZERO,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self.kind {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Chan { content_length, .. } | Kind::H2 { content_length, .. } => {
                content_length.into_opt().map_or_else(
                    SizeHint::default,
                    SizeHint::with_exact,
                )
            }
        }
    }
}

impl fmt::Debug for Incoming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct Streaming;
        #[derive(Debug)]
        struct Empty;

        let mut builder = f.debug_tuple("Body");
        match self.kind {
            Kind::Empty => builder.field(&Empty),
            _ => builder.field(&Streaming),
        };

        builder.finish()
    }
}

// ===== impl Sender =====

impl Sender {
    /// Check to see if this `Sender` can send more data.
    pub(crate) fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<crate::core::Result<()>> {
        std::task::ready!(self.poll_want(cx)?);
        self.tx
            .poll_ready(cx)
            .map_err(|_| crate::core::Error::new_closed())
    }

    fn poll_want(&mut self, cx: &mut Context<'_>) -> Poll<crate::core::Result<()>> {
        match self.want_rx.load(cx) {
            WANT_READY => Poll::Ready(Ok(())),
            WANT_PENDING => Poll::Pending,
            crate::core::common::watch::CLOSED => {
                Poll::Ready(Err(crate::core::Error::new_closed()))
            }
            unexpected => unreachable!("want_rx value: {}", unexpected),
        }
    }

    /// Send data on data channel when it is ready.
    #[allow(unused)]
    pub(crate) async fn send_data(&mut self, chunk: Bytes) -> crate::core::Result<()> {
        std::future::poll_fn(|cx| self.poll_ready(cx)).await?;
        self.tx
            .try_send(chunk)
            .map_err(|_| crate::core::Error::new_closed())
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish()
    }
}

/// Decorates a `Body` to know its full data length, before reading
/// it all as bytes.
///
/// This type mirrors the length signaling used by the wire codecs: either an
/// exact byte count, a chunked transfer, or a read-to-EOF (connection close
/// delimited) body.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecodedLength(u64);

#[allow(unreachable_patterns)]
impl DecodedLength {
    pub(crate) const CLOSE_DELIMITED: DecodedLength = DecodedLength(u64::MAX);
    pub(crate) const CHUNKED: DecodedLength = DecodedLength(u64::MAX - 1);
    pub(crate) const ZERO: DecodedLength = DecodedLength(0);

    /// Returns whether the length is exactly zero.
    #[allow(unused)]
    pub(crate) fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks the `u64` is within the maximum allowed to prevent overflow.
    pub(crate) fn checked_new(len: u64) -> Result<Self, crate::core::error::Parse> {
        if len >= Self::CHUNKED.0 {
            log::trace!("content-length bigger than maximum: {}", Self::CHUNKED.0);
            Err(crate::core::error::Parse::TooLarge)
        } else {
            Ok(DecodedLength(len))
        }
    }

    pub(crate) fn sub_if(&mut self, amt: u64) {
        match self.0 {
            Self::CLOSE_DELIMITED.0 | Self::CHUNKED.0 => (),
            known => {
                self.0 = known.saturating_sub(amt);
            }
        }
    }

    /// Converts to an `Option<u64>` representing a numeric length, if set.
    ///
    /// References to CLOSE_DELIMITED or CHUNKED get converted to `None`.
    pub(crate) fn into_opt(self) -> Option<u64> {
        match self.0 {
            Self::CLOSE_DELIMITED.0 | Self::CHUNKED.0 => None,
            known => Some(known),
        }
    }
}

impl fmt::Debug for DecodedLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Self::CLOSE_DELIMITED.0 => f.write_str("CLOSE_DELIMITED"),
            Self::CHUNKED.0 => f.write_str("CHUNKED"),
            known => f.debug_tuple("DecodedLength").field(&known).finish(),
        }
    }
}

impl From<DecodedLength> for Option<u64> {
    fn from(len: DecodedLength) -> Self {
        len.into_opt()
    }
}
