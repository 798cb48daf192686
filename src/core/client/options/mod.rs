pub mod http1;
pub mod http2;

use http::Version;
use http1::Http1Options;
use http2::Http2Options;

use crate::{
    core::client::connect::TcpConnectOptions, proxy::Matcher as ProxyMatcher, tls::TlsOptions,
};

/// Transport options for HTTP/1, HTTP/2, and TLS layers.
///
/// This struct allows you to customize protocol-specific and TLS settings
/// for network connections made by the client.
#[must_use]
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub struct TransportOptions {
    tls_options: Option<TlsOptions>,
    http1_options: Option<Http1Options>,
    http2_options: Option<Http2Options>,
}

impl TransportOptions {
    /// Sets the HTTP/1 options configuration.
    #[inline]
    pub fn set_http1_options<C>(&mut self, config: C) -> &mut Self
    where
        C: Into<Option<Http1Options>>,
    {
        if let Some(http1) = config.into() {
            self.http1_options = Some(http1);
        }
        self
    }

    /// Sets the HTTP/2 options configuration.
    #[inline]
    pub fn set_http2_options<C>(&mut self, config: C) -> &mut Self
    where
        C: Into<Option<Http2Options>>,
    {
        if let Some(http2) = config.into() {
            self.http2_options = Some(http2);
        }
        self
    }

    /// Sets the TLS options configuration.
    #[inline]
    pub fn set_tls_options<C>(&mut self, config: C) -> &mut Self
    where
        C: Into<Option<TlsOptions>>,
    {
        if let Some(tls) = config.into() {
            self.tls_options = Some(tls);
        }
        self
    }

    /// Returns a reference to the HTTP/1 options configuration, if set.
    #[inline]
    pub fn http1_options(&self) -> Option<&Http1Options> {
        self.http1_options.as_ref()
    }

    /// Returns a reference to the HTTP/2 options configuration, if set.
    #[inline]
    pub fn http2_options(&self) -> Option<&Http2Options> {
        self.http2_options.as_ref()
    }

    /// Returns a reference to the TLS options configuration, if set.
    #[inline]
    pub fn tls_options(&self) -> Option<&TlsOptions> {
        self.tls_options.as_ref()
    }

    /// Merges any `Some` fields of `other` into `self`, leaving unset fields untouched.
    #[inline]
    pub(crate) fn apply_transport_options(&mut self, other: Option<TransportOptions>) -> &mut Self {
        if let Some(other) = other {
            if other.tls_options.is_some() {
                self.tls_options = other.tls_options;
            }
            if other.http1_options.is_some() {
                self.http1_options = other.http1_options;
            }
            if other.http2_options.is_some() {
                self.http2_options = other.http2_options;
            }
        }
        self
    }

    /// Consumes the transport options and returns the individual parts.
    #[inline]
    pub fn into_parts(
        self,
    ) -> (
        Option<TlsOptions>,
        Option<Http1Options>,
        Option<Http2Options>,
    ) {
        (self.tls_options, self.http1_options, self.http2_options)
    }
}

/// Bundles the per-request options consulted when establishing a connection: the enforced
/// HTTP version, proxy matcher, TCP connect options, and transport (HTTP/1, HTTP/2, TLS)
/// options.
#[must_use]
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub(crate) struct RequestOptions {
    enforced_version: Option<Version>,
    proxy_matcher: Option<ProxyMatcher>,
    tcp_connect_opts: TcpConnectOptions,
    transport_opts: TransportOptions,
}

impl RequestOptions {
    /// Returns the enforced HTTP version, if any.
    #[inline]
    pub(crate) fn enforced_version(&self) -> Option<Version> {
        self.enforced_version
    }

    /// Returns a mutable reference to the enforced HTTP version.
    #[inline]
    pub(crate) fn enforced_version_mut(&mut self) -> &mut Option<Version> {
        &mut self.enforced_version
    }

    /// Returns a reference to the proxy matcher, if any.
    #[inline]
    pub(crate) fn proxy_matcher(&self) -> Option<&ProxyMatcher> {
        self.proxy_matcher.as_ref()
    }

    /// Returns a mutable reference to the proxy matcher.
    #[inline]
    pub(crate) fn proxy_matcher_mut(&mut self) -> &mut Option<ProxyMatcher> {
        &mut self.proxy_matcher
    }

    /// Returns a reference to the transport (HTTP/1, HTTP/2, TLS) options.
    #[inline]
    pub(crate) fn transport_opts(&self) -> &TransportOptions {
        &self.transport_opts
    }

    /// Returns a mutable reference to the transport (HTTP/1, HTTP/2, TLS) options.
    #[inline]
    pub(crate) fn transport_opts_mut(&mut self) -> &mut TransportOptions {
        &mut self.transport_opts
    }

    /// Returns a reference to the TCP connect options.
    #[inline]
    pub(crate) fn tcp_connect_opts(&self) -> &TcpConnectOptions {
        &self.tcp_connect_opts
    }

    /// Returns a mutable reference to the TCP connect options.
    #[inline]
    pub(crate) fn tcp_connect_opts_mut(&mut self) -> &mut TcpConnectOptions {
        &mut self.tcp_connect_opts
    }
}
