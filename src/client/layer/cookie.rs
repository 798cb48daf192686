//! Middleware to use Cookie.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use bytes::BufMut;
use http::{HeaderValue, Request, Response, Uri, header::COOKIE};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::{config::RequestConfig, cookie::CookieStore};

/// The `Cookie` header value(s) to attach to an outgoing request.
///
/// A single joined header is preferred (fewer bytes on the wire, one header line); if the
/// joined value somehow isn't a legal header value, each cookie is sent on its own `Cookie` line
/// instead.
enum Cookies {
    Compressed(HeaderValue),
    Uncompressed(Vec<HeaderValue>),
    Empty,
}

impl Cookies {
    fn from_store(store: &dyn CookieStore, url: &Uri) -> Self {
        let url = match url.to_string().parse::<url::Url>() {
            Ok(url) => url,
            Err(_) => return Cookies::Empty,
        };
        let values = match store.cookies(&url) {
            Some(values) if !values.is_empty() => values,
            _ => return Cookies::Empty,
        };

        let mut joined = bytes::BytesMut::with_capacity(values.iter().map(|v| v.len() + 2).sum());
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                joined.put_slice(b"; ");
            }
            joined.put_slice(value.as_bytes());
        }

        match HeaderValue::from_maybe_shared(joined.freeze()) {
            Ok(value) => Cookies::Compressed(value),
            Err(_) => Cookies::Uncompressed(values),
        }
    }
}

pin_project! {
    /// Response future for [`CookieManager`].
    #[project = ResponseFutureProj]
    pub enum ResponseFuture<Fut> {
        Managed {
            #[pin]
            fut: Fut,
            uri: Uri,
            store: Arc<dyn CookieStore>,
        },
        Plain {
            #[pin]
            fut: Fut,
        },
    }
}

/// Layer to apply [`CookieManager`] middleware.
#[derive(Clone)]
pub struct CookieManagerLayer {
    store: RequestConfig<Arc<dyn CookieStore>>,
}

/// Middleware to use [`CookieStore`].
#[derive(Clone)]
pub struct CookieManager<S> {
    inner: S,
    store: RequestConfig<Arc<dyn CookieStore>>,
}

// ===== impl ResponseFuture =====

impl<F, ResBody, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Managed { fut, uri, store } => {
                let res = ready!(fut.poll(cx)?);
                let mut cookies = res
                    .headers()
                    .get_all(http::header::SET_COOKIE)
                    .iter()
                    .peekable();
                if cookies.peek().is_some() {
                    store.set_cookies(&mut cookies, uri);
                }

                Poll::Ready(Ok(res))
            }
            ResponseFutureProj::Plain { fut: mut future } => future.as_mut().poll(cx),
        }
    }
}

// ===== impl CookieManagerLayer =====

impl CookieManagerLayer {
    /// Create a new [`CookieManagerLayer`].
    #[inline(always)]
    pub const fn new(store: Option<Arc<dyn CookieStore + 'static>>) -> Self {
        Self {
            store: RequestConfig::new(store),
        }
    }
}

impl<S> Layer<S> for CookieManagerLayer {
    type Service = CookieManager<S>;

    #[inline(always)]
    fn layer(&self, inner: S) -> Self::Service {
        CookieManager {
            inner,
            store: self.store.clone(),
        }
    }
}

// ===== impl CookieManager =====

impl<S> CookieManager<S> {
    fn inject_cookies<B>(
        &self,
        req: &mut Request<B>,
        store: Arc<dyn CookieStore>,
    ) -> (Arc<dyn CookieStore>, Uri) {
        let uri = req.uri().clone();
        let headers = req.headers_mut();

        // Only inject cookies if request doesn't already have them
        if !headers.contains_key(COOKIE) {
            match Cookies::from_store(store.as_ref(), &uri) {
                Cookies::Compressed(value) => {
                    headers.insert(COOKIE, value);
                }
                Cookies::Uncompressed(values) => {
                    for value in values {
                        headers.append(COOKIE, value);
                    }
                }
                Cookies::Empty => (),
            }
        }

        (store, uri)
    }
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for CookieManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    #[inline(always)]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        match self
            .store
            .fetch(req.extensions())
            .cloned()
            .map(|store| self.inject_cookies(&mut req, store))
        {
            Some((store, uri)) => ResponseFuture::Managed {
                uri,
                store,
                fut: self.inner.call(req),
            },
            None => ResponseFuture::Plain {
                fut: self.inner.call(req),
            },
        }
    }
}

impl_request_config_value!(Arc<dyn CookieStore>);
