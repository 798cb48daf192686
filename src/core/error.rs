//! Error and Result module.
use std::{error::Error as StdError, fmt};

/// Result type often returned from methods that can have `core` `Error`s.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur handling HTTP streams.
pub struct Error {
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: Kind,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

#[derive(Debug)]
pub(crate) enum Kind {
    Parse(Parse),
    User(User),
    /// A message reached EOF, but is not complete.
    IncompleteMessage,
    /// A connection received a message (or bytes) when not waiting for one.
    UnexpectedMessage,
    /// A pending item was dropped before it could complete.
    Canceled,
    /// Indicates a channel (client) was closed.
    ChannelClosed,
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io,
    /// Error occurred while connecting.
    Connect,
    /// A body and related lines in the HTTP message (transfer-encoding,
    /// content-length) did not align.
    Body,
    /// Error calling AsyncWrite::shutdown()
    Shutdown,
    /// A general error from `h2`.
    Http2,
}

/// Describes parsing failures that happen when parsing an HTTP stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Parse {
    Method,
    Version,
    VersionH2,
    Uri,
    #[allow(unused)]
    UriTooLong,
    Header(Header),
    TooLarge,
    Status,
    Internal,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Header {
    Token,
    ContentLengthInvalid,
    TransferEncodingInvalid,
    TransferEncodingUnexpected,
}

#[derive(Debug)]
pub(crate) enum User {
    /// The user aborted writing of the outgoing body.
    AbortedBody,
    /// The user aborted reading of the incoming body.
    #[allow(unused)]
    AbortedRead,
    /// Error while reading a body from application.
    Body,
    /// The user attempted to send a certain request programmatically which
    /// violates our protocol invariants.
    UnsupportedRequestMethod,
    /// The user attempted to send a certain request programmatically which
    /// violates our protocol invariants.
    UnsupportedVersion,
    /// The user attempted to construct a request with invalid content.
    UnexpectedHeader,
    /// The user tried to send a request with a forbidden method/target
    /// combination. For example, a request with CONNECT method and a
    /// non-authority target URI.
    #[allow(unused)]
    InvalidRequest,
    /// The user tried polling for an upgrade that doesn't exist.
    NoUpgrade,
    /// The user tried to poll a version again after h1 or h2 upgrade(s).
    ManualUpgrade,
    /// The dispatch task is gone.
    DispatchGone,
    /// User tried to poll without tokio enabled features.
    #[allow(unused)]
    NoRuntime,
    /// User called `server::conn::Connection::without_shutdown()` on an
    /// HTTP/2 connection.
    #[allow(unused)]
    WithoutShutdownNonHttp1,
}

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

impl Error {
    /// Returns true if this was an HTTP parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self.inner.kind, Kind::Parse(_))
    }

    /// Returns true if this was an HTTP/2 error.
    pub fn is_http2(&self) -> bool {
        matches!(self.inner.kind, Kind::Http2)
    }

    /// Returns true if this error was caused by user code.
    pub fn is_user(&self) -> bool {
        matches!(self.inner.kind, Kind::User(_))
    }

    /// Returns true if this was about a `Request` that was canceled.
    pub fn is_canceled(&self) -> bool {
        matches!(self.inner.kind, Kind::Canceled)
    }

    /// Returns true if a sender's channel is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self.inner.kind, Kind::ChannelClosed)
    }

    /// Returns true if this was an error from `Connect`.
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if the connection closed before a message could complete.
    pub fn is_incomplete_message(&self) -> bool {
        matches!(self.inner.kind, Kind::IncompleteMessage)
    }

    /// Returns true if the body could not be sent or received.
    pub fn is_body_write_aborted(&self) -> bool {
        matches!(self.inner.kind, Kind::User(User::AbortedBody))
    }

    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(ErrorImpl { kind, cause: None }),
        }
    }

    pub(crate) fn with<C: Into<BoxError>>(mut self, cause: C) -> Error {
        self.inner.cause = Some(cause.into());
        self
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    fn description(&self) -> &str {
        match self.inner.kind {
            Kind::Parse(Parse::Method) => "invalid HTTP method parsed",
            Kind::Parse(Parse::Version) => "invalid HTTP version parsed",
            Kind::Parse(Parse::VersionH2) => "invalid HTTP version parsed (h2 required)",
            Kind::Parse(Parse::Uri) => "invalid URI",
            Kind::Parse(Parse::UriTooLong) => "URI too long",
            Kind::Parse(Parse::Header(Header::Token)) => "invalid HTTP header parsed",
            Kind::Parse(Parse::Header(Header::ContentLengthInvalid)) => {
                "invalid content-length parsed"
            }
            Kind::Parse(Parse::Header(Header::TransferEncodingInvalid)) => {
                "invalid transfer-encoding parsed"
            }
            Kind::Parse(Parse::Header(Header::TransferEncodingUnexpected)) => {
                "transfer-encoding header unexpected"
            }
            Kind::Parse(Parse::TooLarge) => "message head is too large",
            Kind::Parse(Parse::Status) => "invalid HTTP status-code parsed",
            Kind::Parse(Parse::Internal) => {
                "internal error inside parser, this should not be seen"
            }
            Kind::IncompleteMessage => "connection closed before message completed",
            Kind::UnexpectedMessage => "received unexpected message from connection",
            Kind::ChannelClosed => "channel closed",
            Kind::Canceled => "operation was canceled",
            Kind::Connect => "error trying to connect",
            Kind::Io => "connection error",
            Kind::Body => "error reading a body from connection",
            Kind::Shutdown => "error shutting down connection",
            Kind::Http2 => "http2 error",
            Kind::User(User::Body) => "error from user's Body stream",
            Kind::User(User::AbortedBody) => "user body write aborted",
            Kind::User(User::AbortedRead) => "user body read aborted",
            Kind::User(User::UnsupportedRequestMethod) => "request has unsupported method",
            Kind::User(User::UnsupportedVersion) => "request has unsupported HTTP version",
            Kind::User(User::UnexpectedHeader) => "user sent unexpected header",
            Kind::User(User::InvalidRequest) => "user sent invalid request",
            Kind::User(User::NoUpgrade) => "no upgrade available",
            Kind::User(User::ManualUpgrade) => "upgrade expected but low level API in use",
            Kind::User(User::DispatchGone) => "dispatch task is gone",
            Kind::User(User::NoRuntime) => "no runtime was polled without a tokio runtime",
            Kind::User(User::WithoutShutdownNonHttp1) => {
                "without_shutdown() called on a non-HTTP/1 connection"
            }
        }
    }

    // Constructors used across proto/h1, proto/h2, and client/connect.

    pub(crate) fn new_canceled() -> Error {
        Error::new(Kind::Canceled)
    }

    pub(crate) fn new_incomplete() -> Error {
        Error::new(Kind::IncompleteMessage)
    }

    pub(crate) fn new_too_large() -> Error {
        Error::new(Kind::Parse(Parse::TooLarge))
    }

    pub(crate) fn new_unexpected_message() -> Error {
        Error::new(Kind::UnexpectedMessage)
    }

    pub(crate) fn new_io(cause: std::io::Error) -> Error {
        Error::new(Kind::Io).with(cause)
    }

    pub(crate) fn new_closed() -> Error {
        Error::new(Kind::ChannelClosed)
    }

    pub(crate) fn new_connect<E: Into<BoxError>>(cause: E) -> Error {
        Error::new(Kind::Connect).with(cause)
    }

    pub(crate) fn new_body<E: Into<BoxError>>(cause: E) -> Error {
        Error::new(Kind::Body).with(cause)
    }

    pub(crate) fn new_body_write<E: Into<BoxError>>(cause: E) -> Error {
        Error::new(Kind::User(User::Body)).with(cause)
    }

    pub(crate) fn new_shutdown(cause: std::io::Error) -> Error {
        Error::new(Kind::Shutdown).with(cause)
    }

    pub(crate) fn new_h2(cause: h2::Error) -> Error {
        if cause.reason() == Some(h2::Reason::HTTP_1_1_REQUIRED) {
            Error::new(Kind::Http2).with(cause)
        } else {
            Error::new(Kind::Http2).with(cause)
        }
    }

    pub(crate) fn new_user(user: User) -> Error {
        Error::new(Kind::User(user))
    }

    pub(crate) fn new_user_body<E: Into<BoxError>>(cause: E) -> Error {
        Error::new(Kind::User(User::Body)).with(cause)
    }

    pub(crate) fn new_user_unsupported_request_method() -> Error {
        Error::new(Kind::User(User::UnsupportedRequestMethod))
    }

    pub(crate) fn new_user_unsupported_version() -> Error {
        Error::new(Kind::User(User::UnsupportedVersion))
    }

    pub(crate) fn new_user_unexpected_header() -> Error {
        Error::new(Kind::User(User::UnexpectedHeader))
    }

    pub(crate) fn new_user_no_upgrade() -> Error {
        Error::new(Kind::User(User::NoUpgrade))
    }

    pub(crate) fn new_user_manual_upgrade() -> Error {
        Error::new(Kind::User(User::ManualUpgrade))
    }

    pub(crate) fn new_user_dispatch_gone() -> Error {
        Error::new(Kind::User(User::DispatchGone))
    }

    pub(crate) fn new_parse(parse: Parse) -> Error {
        Error::new(Kind::Parse(parse))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("core::Error");
        f.field(&self.inner.kind);
        if let Some(ref cause) = self.inner.cause {
            f.field(cause);
        }
        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())?;
        if let Some(ref cause) = self.inner.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.cause.as_ref().map(|e| &**e as _)
    }
}

impl From<Parse> for Error {
    fn from(err: Parse) -> Error {
        Error::new_parse(err)
    }
}

impl Parse {
    pub(crate) fn transfer_encoding_unexpected() -> Self {
        Parse::Header(Header::TransferEncodingUnexpected)
    }

    pub(crate) fn content_length_invalid() -> Self {
        Parse::Header(Header::ContentLengthInvalid)
    }
}

impl From<httparse::Error> for Parse {
    fn from(err: httparse::Error) -> Self {
        match err {
            httparse::Error::HeaderName
            | httparse::Error::HeaderValue
            | httparse::Error::NewLine
            | httparse::Error::Token => Parse::Header(Header::Token),
            httparse::Error::Status => Parse::Status,
            httparse::Error::TooManyHeaders => Parse::TooLarge,
            httparse::Error::Version => Parse::Version,
            _ => Parse::Internal,
        }
    }
}
