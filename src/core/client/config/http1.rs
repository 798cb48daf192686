//! Connection-level HTTP/1 configuration.
//!
//! These are the same knobs exposed by [`crate::core::client::options::http1`], re-exported
//! here under the name expected by the transport configuration layer.

pub(crate) use crate::core::client::options::http1::{
    Http1Options as Http1Config, Http1OptionsBuilder as Http1ConfigBuilder,
};
