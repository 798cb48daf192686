use crate::TlsConfig;
use crate::client::config::http1::Http1Config;
use crate::client::config::http2::Http2Config;
use http::{HeaderMap, HeaderName};
use std::borrow::Cow;

/// Trait defining the interface for providing an `ConnectionSpec`.
///
/// The `ConnectionSpecFactory` trait is designed to be implemented by types that can provide
/// an `ConnectionSpec` instance. This trait abstracts the creation and configuration of
/// `ConnectionSpec`, allowing different types to offer their own specific configurations.
///
/// # Example
///
/// ```rust
/// use wreq::{ConnectionSpecFactory, ConnectionSpec};
///
/// struct MyConnectionSpec;
///
/// impl ConnectionSpecFactory for MyConnectionSpec {
///     fn connection_spec(self) -> ConnectionSpec {
///         ConnectionSpec::default()
///     }
/// }
///
/// let provider = MyConnectionSpec.connection_spec();
/// ```
pub trait ConnectionSpecFactory {
    /// Provides an `ConnectionSpec` instance.
    fn connection_spec(self) -> ConnectionSpec;
}

/// Builder for creating an `ConnectionSpec`.
#[must_use]
#[derive(Debug)]
pub struct ConnectionSpecBuilder {
    provider: ConnectionSpec,
}

/// HTTP connection context that manages both HTTP and TLS configurations.
///
/// The `ConnectionSpec` provides a complete environment for HTTP connections,
/// including both HTTP-specific settings and the underlying TLS configuration.
/// This unified context ensures consistent behavior across connections.
///
/// # Components
///
/// - **TLS Configuration**: Manages secure connection settings.
/// - **HTTP Settings**: Controls HTTP/1 and HTTP/2 behaviors.
/// - **Header Management**: Handles default headers and their ordering.
///
/// # Example
///
/// ```rust
/// use wreq::ConnectionSpec;
/// use wreq::TlsConfig;
///
/// let provider = ConnectionSpec::builder()
///     .tls_config(TlsConfig::default())
///     .build();
/// ```
#[derive(Default, Debug)]
pub struct ConnectionSpec {
    pub(crate) tls_config: Option<TlsConfig>,
    pub(crate) http1_config: Option<Http1Config>,
    pub(crate) http2_config: Option<Http2Config>,
    pub(crate) default_headers: Option<HeaderMap>,
    pub(crate) headers_order: Option<Cow<'static, [HeaderName]>>,
}

impl ConnectionSpecBuilder {
    /// Sets the TLS configuration for the `ConnectionSpec`.
    pub fn tls_config<C>(mut self, config: C) -> Self
    where
        C: Into<Option<TlsConfig>>,
    {
        self.provider.tls_config = config.into();
        self
    }

    /// Sets the HTTP/1 configuration for the `ConnectionSpec`.
    pub fn http1_config<C>(mut self, config: C) -> Self
    where
        C: Into<Option<Http1Config>>,
    {
        self.provider.http1_config = config.into();
        self
    }

    /// Sets the HTTP/2 configuration for the `ConnectionSpec`.
    pub fn http2_config<C>(mut self, config: C) -> Self
    where
        C: Into<Option<Http2Config>>,
    {
        self.provider.http2_config = config.into();
        self
    }

    /// Sets the default headers for the `ConnectionSpec`.
    pub fn default_headers<H>(mut self, headers: H) -> Self
    where
        H: Into<Option<HeaderMap>>,
    {
        self.provider.default_headers = headers.into();
        self
    }

    /// Sets the order of headers for the `ConnectionSpec`.
    pub fn headers_order<O>(mut self, order: O) -> Self
    where
        O: Into<Cow<'static, [HeaderName]>>,
    {
        self.provider.headers_order = Some(order.into());
        self
    }

    /// Builds the `ConnectionSpec` instance.
    pub fn build(self) -> ConnectionSpec {
        self.provider
    }
}

impl ConnectionSpec {
    /// Creates a new `ConnectionSpecBuilder`.
    ///
    /// # Returns
    ///
    /// Returns a new `ConnectionSpecBuilder` instance.
    pub fn builder() -> ConnectionSpecBuilder {
        ConnectionSpecBuilder {
            provider: ConnectionSpec::default(),
        }
    }
}

/// Implement `ConnectionSpecFactory` for `ConnectionSpec`.
///
/// This implementation allows an `ConnectionSpec` to be used wherever an
/// `ConnectionSpecFactory` is required, providing a default connection_spec configuration.
impl ConnectionSpecFactory for ConnectionSpec {
    fn connection_spec(self) -> ConnectionSpec {
        self
    }
}
