mod layer;

pub use self::layer::{ConfigService, ConfigServiceLayer};

/// A marker type for the default headers configuration value.
#[derive(Clone, Copy)]
pub(crate) struct DefaultHeaders;

impl_request_config_value!(DefaultHeaders, bool);

/// A marker type for whether a request carries its own default headers,
/// consulted by [`crate::client::http::service::ClientService`].
#[derive(Clone, Copy)]
pub(crate) struct RequestDefaultHeaders;

impl_request_config_value!(RequestDefaultHeaders, bool);

/// A marker type for a per-request override of the redirect [`Policy`](crate::redirect::Policy).
#[derive(Clone, Copy)]
pub(crate) struct RequestRedirectPolicy;

impl_request_config_value!(RequestRedirectPolicy, crate::redirect::Policy);
