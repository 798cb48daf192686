//! HTTP extensions.

mod config;
mod h1_reason_phrase;
mod header;

pub(crate) use config::{
    RequestConfig, RequestConfigValue, RequestEnforcedHttpVersion,
    RequestExtendedConnectProtocol, RequestHttpVersionPref, RequestInterface, RequestIpv4Addr,
    RequestIpv6Addr, RequestLayerOptions, RequestOrigHeaderMap, RequestOriginalHeaders,
    RequestProxyMatcher, RequestTcpConnectOptions, RequestTransportConfig,
};
pub(crate) use h1_reason_phrase::ReasonPhrase;
pub(crate) use header::{OriginalHeaderName, OriginalHeaders};
