//! Lower-level client connection API.
//!
//! The types in this module are to provide a lower-level API based around a
//! single connection. Many higher-level features, such as connection
//! pooling, are not included in this module. Those features are only
//! available with the full `Client`. The types here can be used to set up
//! clients for specific requirements, or if a pool is already being managed
//! externally.

pub mod http1;
pub mod http2;

pub(crate) use super::dispatch::TrySendError;
