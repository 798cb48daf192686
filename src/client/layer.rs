//! Tower middleware layers that make up the client's request pipeline.
//!
//! Each submodule contributes one stage of the pipeline (configuration, caching, cookies,
//! decompression, redirects, retries, timeouts); they are stacked together in
//! `client::http::ClientBuilder::build()`.

#[cfg(feature = "cache")]
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod cookie;
pub(crate) mod decoder;
pub(crate) mod redirect;
pub(crate) mod retry;
pub(crate) mod timeout;
