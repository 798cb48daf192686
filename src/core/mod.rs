//! http client protocol implementation and low level utilities.

#[doc(hidden)]
pub use http;

pub use self::error::{Error, Result};
#[doc(no_inline)]
pub use http::{HeaderMap, Method, Request, Response, StatusCode, Uri, Version, header};

pub mod body;
pub mod client;
mod common;
mod error;
pub mod ext;
mod headers;
mod proto;
pub mod rt;
pub mod upgrade;
