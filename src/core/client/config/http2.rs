//! Connection-level HTTP/2 configuration.
//!
//! These are the same knobs exposed by [`crate::core::client::options::http2`], re-exported
//! here under the name expected by the transport configuration layer.

pub(crate) use crate::core::client::options::http2::{
    Http2Options as Http2Config, Http2OptionsBuilder as Http2ConfigBuilder,
};
