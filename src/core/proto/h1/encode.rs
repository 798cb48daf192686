use http::{HeaderValue, Method};

use super::super::{BodyLength, MessageHead};

/// Encodes the wire body framing to use for an outgoing h1 message, chosen by
/// [`super::role::Client::set_length`] from the request's headers and known
/// body length.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Encoder {
    kind: Kind,
    is_last: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    /// A fixed-length encoder.
    Length(u64),
    /// A chunked encoder, optionally with a fixed list of allowed trailer
    /// field names (from the `Trailer` header) the caller may send.
    Chunked(Option<Vec<HeaderValue>>),
    /// An encoder that simply writes until the body stream reports done,
    /// then the connection must be closed.
    CloseDelimited,
}

impl Encoder {
    pub(crate) fn length(len: u64) -> Encoder {
        Encoder {
            kind: Kind::Length(len),
            is_last: false,
        }
    }

    pub(crate) fn chunked() -> Encoder {
        Encoder {
            kind: Kind::Chunked(None),
            is_last: false,
        }
    }

    #[allow(unused)]
    pub(crate) fn close_delimited() -> Encoder {
        Encoder {
            kind: Kind::CloseDelimited,
            is_last: false,
        }
    }

    pub(crate) fn into_chunked_with_trailing_fields(mut self, fields: Vec<HeaderValue>) -> Self {
        if let Kind::Chunked(ref mut trailers) = self.kind {
            *trailers = Some(fields);
        }
        self
    }

    pub(crate) fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(..))
    }

    #[allow(unused)]
    pub(crate) fn is_eof(&self) -> bool {
        matches!(self.kind, Kind::Length(0))
    }

    pub(crate) fn set_last(mut self, is_last: bool) -> Self {
        self.is_last = is_last;
        self
    }

    /// Writes a single data frame, applying chunk framing if needed.
    pub(crate) fn encode(&mut self, dst: &mut Vec<u8>, msg: &[u8]) {
        match self.kind {
            Kind::Length(ref mut remaining) => {
                let len = (msg.len() as u64).min(*remaining);
                dst.extend_from_slice(&msg[..len as usize]);
                *remaining -= len;
            }
            Kind::Chunked(..) => {
                if !msg.is_empty() {
                    let _ = std::io::Write::write_fmt(dst, format_args!("{:X}\r\n", msg.len()));
                    dst.extend_from_slice(msg);
                    dst.extend_from_slice(b"\r\n");
                }
            }
            Kind::CloseDelimited => {
                dst.extend_from_slice(msg);
            }
        }
    }

    /// Writes the terminating frame: for chunked bodies, the zero-size chunk
    /// plus any declared trailer fields.
    pub(crate) fn end(&self, dst: &mut Vec<u8>, trailers: Option<&http::HeaderMap>) {
        if let Kind::Chunked(ref allowed) = self.kind {
            dst.extend_from_slice(b"0\r\n");
            if let (Some(allowed), Some(trailers)) = (allowed, trailers) {
                for name in allowed {
                    if let Ok(name) = name.to_str() {
                        if let Some(value) = trailers.get(name) {
                            dst.extend_from_slice(name.as_bytes());
                            dst.extend_from_slice(b": ");
                            dst.extend_from_slice(value.as_bytes());
                            dst.extend_from_slice(b"\r\n");
                        }
                    }
                }
            }
            dst.extend_from_slice(b"\r\n");
        }
    }
}

/// A request or response head, paired with the body length the transaction
/// computed and the request method slot to fill in (client side only needs
/// this to remember which method it just wrote, for response decoding).
pub(crate) struct Encode<'a, T> {
    pub(crate) head: &'a mut MessageHead<T>,
    pub(crate) body: Option<BodyLength>,
    pub(crate) keep_alive: bool,
    pub(crate) req_method: &'a mut Option<Method>,
    pub(crate) title_case_headers: bool,
}
