//! Emulation-facing HTTP/1 and HTTP/2 wire configuration.

pub mod http1;
pub mod http2;
