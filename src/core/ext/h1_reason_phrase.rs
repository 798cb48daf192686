use bytes::Bytes;
use std::fmt;

/// The raw bytes of a non-standard HTTP/1 status reason phrase, preserved verbatim from the
/// wire when it differs from the canonical phrase `http::StatusCode` would print.
///
/// Stored as a response extension so callers that care about the exact bytes a server sent
/// (proxies, scrapers mirroring upstream responses) can recover them; everyone else can ignore
/// it and use `StatusCode::canonical_reason()`.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct ReasonPhrase(Bytes);

impl ReasonPhrase {
    /// Builds a `ReasonPhrase` from bytes already known to be a valid `reason-phrase` per
    /// RFC 7230 (no CR, LF, or NUL). Callers must have validated this themselves, typically by
    /// relying on an HTTP/1 parser that already enforces it.
    pub(crate) fn from_bytes_unchecked(bytes: &[u8]) -> Self {
        ReasonPhrase(Bytes::copy_from_slice(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ReasonPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => fmt::Debug::fmt(s, f),
            Err(_) => fmt::Debug::fmt(&self.0, f),
        }
    }
}

impl fmt::Display for ReasonPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
