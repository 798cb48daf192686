//! Pieces pertaining to the HTTP message protocol.
use http::{HeaderMap, Method, Uri, Version};

pub(crate) use h1::Conn;

pub(crate) mod h1;
pub(crate) mod h2;

/// An Incoming or Outgoing message head.
///
/// Includes the version, status/request-line subject, headers, and an
/// extensions bag carried alongside the head for out-of-band metadata (such
/// as a non-canonical reason phrase or the caller's original header casing).
#[derive(Debug, Default)]
pub(crate) struct MessageHead<S> {
    pub(crate) version: Version,
    pub(crate) subject: S,
    pub(crate) headers: HeaderMap,
    pub(crate) extensions: http::Extensions,
}

/// An incoming request-line: `Method` + `Uri`.
#[derive(Debug, Default, Clone)]
pub(crate) struct RequestLine(pub(crate) Method, pub(crate) Uri);

pub(crate) type RequestHead = MessageHead<RequestLine>;

#[derive(Debug)]
pub(crate) enum BodyLength {
    /// Content-Length
    Known(u64),
    /// Transfer-Encoding: chunked (if h1)
    Unknown,
}

/// Status of an indefinite read.
pub(crate) type ParseResult<T> = crate::core::Result<Option<ParsedMessage<T>>>;

#[derive(Debug)]
pub(crate) struct ParsedMessage<T> {
    pub(crate) head: MessageHead<T>,
    pub(crate) decode: crate::core::body::DecodedLength,
    pub(crate) expect_continue: bool,
    pub(crate) keep_alive: bool,
    pub(crate) wants_upgrade: bool,
}

/// Indicates why a dispatcher future completed, so the connection driver
/// knows whether the IO object can be handed back to the caller.
pub(crate) enum Dispatched {
    /// The connection is completely closed.
    Shutdown,
    /// The connection is going to be upgraded to another protocol.
    Upgrade(crate::core::upgrade::Pending),
}
