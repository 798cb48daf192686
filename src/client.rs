mod body;
mod config;
mod connection_spec;
mod http;
mod request;
mod response;
mod upgrade;

pub mod layer;
#[cfg(feature = "multipart")]
pub mod multipart;
#[cfg(feature = "websocket")]
pub mod ws;

pub use self::{
    body::Body,
    config::{http1, http2, http1::Http1Config, http2::Http2Config},
    connection_spec::{ConnectionSpec, ConnectionSpecBuilder, ConnectionSpecFactory},
    http::{Client, ClientBuilder},
    request::{Request, RequestBuilder},
    response::Response,
    upgrade::Upgraded,
};
pub(crate) use self::http::{ConnectIdentifier, ConnectRequest, client::error::Error};
