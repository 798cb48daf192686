//! Middleware implementing the RFC 7234 response cache described in [`crate::cache`].
//!
//! Sits directly on top of the connector service, before decompression, so a cache hit
//! is indistinguishable from a network response to every layer above it.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
    time::SystemTime,
};

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, Method, Request, Response, StatusCode, Uri};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::{
    cache::{Cache, CacheControl, CachedResponse, Freshness, cache_key},
    config::RequestConfig,
};

impl_request_config_value!(Arc<Cache>);

/// Layer that consults and populates a [`Cache`] around an inner service.
#[derive(Clone)]
pub(crate) struct CacheLayer {
    cache: RequestConfig<Arc<Cache>>,
}

impl CacheLayer {
    pub(crate) const fn new(cache: Option<Arc<Cache>>) -> Self {
        CacheLayer {
            cache: RequestConfig::new(cache),
        }
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = CacheService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CacheService {
            inner,
            cache: self.cache.clone(),
        }
    }
}

/// Service that serves cache hits directly and otherwise forwards to `inner`, writing
/// eligible responses back to the cache as their bodies are read.
#[derive(Clone)]
pub(crate) struct CacheService<S> {
    inner: S,
    cache: RequestConfig<Arc<Cache>>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CacheService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>, Error = crate::error::BoxError>
        + Clone,
    ResBody: Body<Data = Bytes>,
{
    type Response = Response<CacheBody<ResBody>>;
    type Error = crate::error::BoxError;
    type Future = CacheFuture<S::Future, ResBody>;

    #[inline(always)]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let Some(cache) = self.cache.fetch(req.extensions()).cloned() else {
            return CacheFuture::Pass {
                fut: self.inner.call(req),
            };
        };

        let request_cc = CacheControl::from_headers(req.headers());
        if request_cc.no_store() {
            return CacheFuture::Pass {
                fut: self.inner.call(req),
            };
        }

        let method = req.method().clone();
        let uri = req.uri().clone();
        let key = cache_key(&uri);

        if method != Method::GET {
            if matches!(
                method,
                Method::POST | Method::PUT | Method::PATCH | Method::DELETE
            ) {
                return CacheFuture::Invalidate {
                    fut: self.inner.call(req),
                    cache,
                    key,
                };
            }
            return CacheFuture::Pass {
                fut: self.inner.call(req),
            };
        }

        let cached = cache
            .store
            .get(&key)
            .filter(|entry| entry.matches_vary(req.headers()));

        if let Some(cached) = cached {
            if !request_cc.no_cache() {
                match cached.freshness(SystemTime::now()) {
                    Freshness::Fresh => {
                        return CacheFuture::Hit {
                            response: Some(build_cached_response(&cached)),
                        };
                    }
                    Freshness::Stale {
                        has_validator: true,
                    } => {
                        for (name, value) in cached.conditional_headers().iter() {
                            req.headers_mut().insert(name.clone(), value.clone());
                        }
                        return CacheFuture::Revalidate {
                            fut: self.inner.call(req),
                            cached: Some(cached),
                            cache,
                            key,
                        };
                    }
                    Freshness::Stale {
                        has_validator: false,
                    } => {}
                }
            }
        } else if request_cc.only_if_cached {
            return CacheFuture::Hit {
                response: Some(gateway_timeout()),
            };
        }

        let snapshot = RequestSnapshot {
            uri,
            method,
            headers: req.headers().clone(),
            requested_at: SystemTime::now(),
        };

        CacheFuture::Store {
            fut: self.inner.call(req),
            cache,
            key,
            snapshot: Some(snapshot),
        }
    }
}

/// The bits of the request needed to populate a cache entry once the response arrives.
struct RequestSnapshot {
    uri: Uri,
    method: Method,
    headers: HeaderMap,
    requested_at: SystemTime,
}

pin_project! {
    /// Response future for [`CacheService`].
    #[project = CacheFutureProj]
    pub(crate) enum CacheFuture<F, B> {
        /// Answered entirely from the cache; no network call was made.
        Hit {
            response: Option<Response<CacheBody<B>>>,
        },
        /// No cache configured, or the request opted out of caching.
        Pass {
            #[pin]
            fut: F,
        },
        /// A conditional request was sent to revalidate a stale entry.
        Revalidate {
            #[pin]
            fut: F,
            cached: Option<CachedResponse>,
            cache: Arc<Cache>,
            key: String,
        },
        /// A fresh network fetch whose response may be written back to the cache.
        Store {
            #[pin]
            fut: F,
            cache: Arc<Cache>,
            key: String,
            snapshot: Option<RequestSnapshot>,
        },
        /// A mutating request whose success invalidates any cached entry for the URL.
        Invalidate {
            #[pin]
            fut: F,
            cache: Arc<Cache>,
            key: String,
        },
    }
}

impl<F, B, E> Future for CacheFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body<Data = Bytes>,
{
    type Output = Result<Response<CacheBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            CacheFutureProj::Hit { response } => {
                Poll::Ready(Ok(response.take().expect("CacheFuture::Hit polled twice")))
            }
            CacheFutureProj::Pass { fut } => {
                let response = ready!(fut.poll(cx))?;
                Poll::Ready(Ok(response.map(CacheBody::passthrough)))
            }
            CacheFutureProj::Revalidate {
                fut,
                cached,
                cache,
                key,
            } => {
                let response = ready!(fut.poll(cx))?;
                if response.status() == StatusCode::NOT_MODIFIED {
                    let mut entry = cached.take().expect("CacheFuture::Revalidate polled twice");
                    entry.merge_304(response.headers());
                    entry.received_at = SystemTime::now();
                    let merged = build_cached_response(&entry);
                    cache.store.put(key, entry);
                    Poll::Ready(Ok(merged))
                } else {
                    cache.store.remove(key);
                    Poll::Ready(Ok(response.map(CacheBody::passthrough)))
                }
            }
            CacheFutureProj::Store {
                fut,
                cache,
                key,
                snapshot,
            } => {
                let response = ready!(fut.poll(cx))?;
                let (parts, body) = response.into_parts();
                let snapshot = snapshot.take().expect("CacheFuture::Store polled twice");
                let sink = should_store(&parts).then(|| Sink {
                    cache: cache.clone(),
                    key: key.clone(),
                    uri: snapshot.uri,
                    method: snapshot.method,
                    varying_request_headers: varying_subset(&parts.headers, &snapshot.headers),
                    version: parts.version,
                    status: parts.status,
                    headers: parts.headers.clone(),
                    requested_at: snapshot.requested_at,
                    buf: BytesMut::new(),
                });
                Poll::Ready(Ok(Response::from_parts(
                    parts,
                    CacheBody::Live { body, sink },
                )))
            }
            CacheFutureProj::Invalidate { fut, cache, key } => {
                let response = ready!(fut.poll(cx))?;
                if response.status().is_success() {
                    cache.store.remove(key);
                }
                Poll::Ready(Ok(response.map(CacheBody::passthrough)))
            }
        }
    }
}

/// Buffers response bytes as they stream by, committing them to the cache once the
/// stream ends. Dropped (and nothing is stored) if the stream errors midway.
struct Sink {
    cache: Arc<Cache>,
    key: String,
    uri: Uri,
    method: Method,
    varying_request_headers: HeaderMap,
    version: http::Version,
    status: StatusCode,
    headers: HeaderMap,
    requested_at: SystemTime,
    buf: BytesMut,
}

impl Sink {
    fn commit(self) {
        let entry = CachedResponse {
            uri: self.uri,
            request_method: self.method,
            varying_request_headers: self.varying_request_headers,
            version: self.version,
            status: self.status,
            headers: self.headers,
            body: self.buf.freeze(),
            // TLS peer certificate metadata is only available on the connection itself,
            // not threaded through to responses at this layer.
            tls_peer_certificate: None,
            requested_at: self.requested_at,
            received_at: SystemTime::now(),
        };
        self.cache.store.put(&self.key, entry);
    }
}

pin_project! {
    /// Response body produced by [`CacheService`]: either the live network body (optionally
    /// teeing bytes into a [`Sink`] as they're read) or bytes already held by a cache hit.
    #[project = CacheBodyProj]
    pub(crate) enum CacheBody<B> {
        Live {
            #[pin]
            body: B,
            sink: Option<Sink>,
        },
        Cached {
            bytes: Option<Bytes>,
        },
    }
}

impl<B> CacheBody<B> {
    fn passthrough(body: B) -> Self {
        CacheBody::Live { body, sink: None }
    }
}

impl<B> Body for CacheBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        match self.project() {
            CacheBodyProj::Live { body, sink } => match ready!(body.poll_frame(cx)) {
                Some(Ok(frame)) => {
                    if let (Some(data), Some(sink)) = (frame.data_ref(), sink.as_mut()) {
                        sink.buf.extend_from_slice(data);
                    }
                    Poll::Ready(Some(Ok(frame)))
                }
                Some(Err(err)) => {
                    *sink = None;
                    Poll::Ready(Some(Err(err)))
                }
                None => {
                    if let Some(sink) = sink.take() {
                        sink.commit();
                    }
                    Poll::Ready(None)
                }
            },
            CacheBodyProj::Cached { bytes } => match bytes.take() {
                Some(data) if !data.is_empty() => Poll::Ready(Some(Ok(Frame::data(data)))),
                _ => Poll::Ready(None),
            },
        }
    }

    #[inline(always)]
    fn is_end_stream(&self) -> bool {
        match self {
            CacheBody::Live { body, .. } => body.is_end_stream(),
            CacheBody::Cached { bytes } => bytes.as_ref().is_none_or(|b| b.is_empty()),
        }
    }

    #[inline(always)]
    fn size_hint(&self) -> SizeHint {
        match self {
            CacheBody::Live { body, .. } => body.size_hint(),
            CacheBody::Cached { bytes } => {
                SizeHint::with_exact(bytes.as_ref().map_or(0, |b| b.len() as u64))
            }
        }
    }
}

/// Only complete, non-`no-store` `200 OK` responses carrying either a freshness lifetime
/// or a validator are worth persisting.
fn should_store(parts: &http::response::Parts) -> bool {
    if parts.status != StatusCode::OK {
        return false;
    }
    let cc = CacheControl::from_headers(&parts.headers);
    if cc.no_store() {
        return false;
    }
    cc.max_age().is_some()
        || parts.headers.contains_key(http::header::ETAG)
        || parts.headers.contains_key(http::header::LAST_MODIFIED)
}

/// Picks out the subset of `request_headers` named by the response's `Vary` header.
fn varying_subset(response_headers: &HeaderMap, request_headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for value in response_headers.get_all(http::header::VARY) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for name in value.split(',') {
            let Ok(name) = name.trim().parse::<HeaderName>() else {
                continue;
            };
            if let Some(value) = request_headers.get(&name) {
                out.insert(name, value.clone());
            }
        }
    }
    out
}

fn build_cached_response<B>(cached: &CachedResponse) -> Response<CacheBody<B>> {
    let mut builder = Response::builder()
        .status(cached.status)
        .version(cached.version);
    if let Some(headers) = builder.headers_mut() {
        *headers = cached.headers.clone();
    }
    builder
        .body(CacheBody::Cached {
            bytes: Some(cached.body.clone()),
        })
        .unwrap_or_else(|_| {
            Response::new(CacheBody::Cached {
                bytes: Some(Bytes::new()),
            })
        })
}

fn gateway_timeout<B>() -> Response<CacheBody<B>> {
    let mut response = Response::new(CacheBody::Cached {
        bytes: Some(Bytes::new()),
    });
    *response.status_mut() = StatusCode::GATEWAY_TIMEOUT;
    response
}
