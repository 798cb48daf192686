//! HTTP/1 protocol implementation: parser, encoder, and connection driver.
use http::{HeaderMap, Method};
use httparse::ParserConfig;

pub(crate) use self::{conn::Conn, dispatch::Dispatcher, role::Client as ClientTransaction};

pub(crate) mod conn;
pub(crate) mod decode;
pub(crate) mod dispatch;
pub(crate) mod encode;
pub(crate) mod role;

pub(crate) use self::{
    decode::Decoder,
    encode::{Encode, Encoder},
};

/// Extra context passed to `Http1Transaction::parse`.
pub(crate) struct ParseContext<'a> {
    pub(crate) cached_headers: &'a mut Option<HeaderMap>,
    pub(crate) req_method: &'a mut Option<Method>,
    pub(crate) h1_parser_config: ParserConfig,
    pub(crate) h1_max_headers: Option<usize>,
    pub(crate) h09_responses: bool,
}

/// Parses and encodes one side (client or server) of an HTTP/1 message.
///
/// Implemented by [`role::Client`]; this crate never speaks the server
/// half, so only the client transaction exists.
pub(crate) trait Http1Transaction {
    type Incoming;
    type Outgoing: Default;
    #[cfg(feature = "tracing")]
    const LOG: &'static str;

    fn parse(
        bytes: &mut bytes::BytesMut,
        ctx: ParseContext<'_>,
    ) -> super::ParseResult<Self::Incoming>;

    fn encode(
        msg: Encode<'_, Self::Outgoing>,
        dst: &mut Vec<u8>,
    ) -> crate::core::Result<Encoder>;

    fn on_error(err: &crate::core::Error) -> Option<super::MessageHead<Self::Outgoing>>;

    fn is_client() -> bool;
}
