use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    future::Future,
    hash::Hash,
    num::NonZeroU32,
    pin::Pin,
    sync::{Arc, Mutex, Weak},
    task::{self, Poll},
    time::{Duration, Instant},
};

use super::super::common::{Exec, timer::Timer};

/// Bounds required of a pool key.
pub(crate) trait Key: Clone + Eq + Hash + fmt::Debug + Send + 'static {}
impl<T> Key for T where T: Clone + Eq + Hash + fmt::Debug + Send + 'static {}

/// Config for the connection pool.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Config {
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) max_idle_per_host: usize,
    pub(crate) max_pool_size: Option<NonZeroU32>,
}

/// Whether a checkout must be for an HTTP/2 connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ver {
    Auto,
    Http2,
}

/// A value that can live in the pool.
pub(crate) trait Poolable: Unpin + Send + Sized + 'static {
    /// Whether the connection is still usable.
    fn is_open(&self) -> bool;
    /// Reserve this connection for a single request.
    ///
    /// HTTP/2 connections can be shared between the caller and the copy
    /// kept in the pool; HTTP/1 connections are always unique.
    fn reserve(self) -> Reservation<Self>;
    /// Whether this value may be handed out to more than one checkout
    /// before being returned to the pool.
    fn can_share(&self) -> bool;
}

/// Result of [`Poolable::reserve`].
pub(crate) enum Reservation<T> {
    Unique(T),
    Shared(T, T),
}

struct Idle<T> {
    value: T,
    idle_at: Instant,
}

struct PoolInner<T, K: Key> {
    connecting: HashSet<K>,
    idle: HashMap<K, VecDeque<Idle<T>>>,
    max_idle_per_host: usize,
    #[allow(dead_code)]
    max_pool_size: Option<NonZeroU32>,
    waiters: HashMap<K, VecDeque<task::Waker>>,
    timeout: Option<Duration>,
    #[allow(dead_code)]
    timer: Option<Timer>,
    #[allow(dead_code)]
    exec: Exec,
}

/// A pool of reusable, keyed connections.
///
/// Cloning a `Pool` is cheap: clones share the same underlying storage.
/// A pool with `max_idle_per_host == 0` is disabled and never stores idle
/// connections; [`Pool::checkout`] then always waits on a fresh connect.
pub(crate) struct Pool<T, K: Key> {
    inner: Option<Arc<Mutex<PoolInner<T, K>>>>,
}

impl<T, K: Key> Clone for Pool<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, K: Key> fmt::Debug for Pool<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl<T: Poolable, K: Key> Pool<T, K> {
    pub(crate) fn new(config: Config, exec: Exec, timer: Option<Timer>) -> Pool<T, K> {
        let inner = (config.max_idle_per_host > 0).then(|| {
            Arc::new(Mutex::new(PoolInner {
                connecting: HashSet::new(),
                idle: HashMap::new(),
                max_idle_per_host: config.max_idle_per_host,
                max_pool_size: config.max_pool_size,
                waiters: HashMap::new(),
                timeout: config.idle_timeout,
                timer,
                exec,
            }))
        });

        Pool { inner }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// A future resolving to a ready idle connection for `key`, if and when
    /// one becomes available. Race this against a fresh connect.
    pub(crate) fn checkout(&self, key: K) -> Checkout<T, K> {
        Checkout {
            key,
            pool: self.clone(),
            parked: false,
        }
    }

    /// Try to take the "connecting" lock for `key`.
    ///
    /// Returns `None` when `ver` is HTTP/2 and another task already holds
    /// the lock for this key: that task's result will be shared.
    pub(crate) fn connecting(&self, key: K, ver: Ver) -> Option<Connecting<T, K>> {
        if ver == Ver::Http2 {
            if let Some(ref inner) = self.inner {
                let mut locked = inner.lock().unwrap();
                if !locked.connecting.insert(key.clone()) {
                    return None;
                }
            }
        }
        Some(Connecting {
            key: Some(key),
            pool: self.clone(),
        })
    }

    /// Wrap a freshly established connection as a pooled value, consuming
    /// the `connecting` lock.
    pub(crate) fn pooled(&self, mut connecting: Connecting<T, K>, value: T) -> Pooled<T, K> {
        let key = connecting.key.take().expect("not yet dropped");
        let value = match value.reserve() {
            Reservation::Shared(to_insert, to_return) => {
                self.put(key.clone(), to_insert);
                to_return
            }
            Reservation::Unique(value) => value,
        };

        Pooled {
            key: Some(key),
            is_reused: false,
            pool: self.downgrade(),
            value: Some(value),
        }
    }

    fn downgrade(&self) -> WeakOpt<T, K> {
        WeakOpt(self.inner.as_ref().map(Arc::downgrade))
    }

    fn take(&self, key: &K) -> Option<Idle<T>> {
        let inner = self.inner.as_ref()?;
        let mut locked = inner.lock().unwrap();
        let list = locked.idle.get_mut(key)?;
        let entry = list.pop_front();
        if list.is_empty() {
            locked.idle.remove(key);
        }
        entry
    }

    fn put(&self, key: K, value: T) {
        let Some(ref inner) = self.inner else {
            return;
        };
        let mut locked = inner.lock().unwrap();
        let max_idle = locked.max_idle_per_host;
        let list = locked.idle.entry(key.clone()).or_default();
        if list.len() < max_idle {
            list.push_back(Idle {
                value,
                idle_at: Instant::now(),
            });
        }
        if let Some(waiters) = locked.waiters.get_mut(&key) {
            while let Some(waker) = waiters.pop_front() {
                waker.wake();
            }
        }
    }

    fn park_waiter(&self, key: &K, waker: task::Waker) {
        if let Some(ref inner) = self.inner {
            let mut locked = inner.lock().unwrap();
            locked
                .waiters
                .entry(key.clone())
                .or_default()
                .push_back(waker);
        }
    }

    fn connecting_done(&self, key: &K) {
        if let Some(ref inner) = self.inner {
            let mut locked = inner.lock().unwrap();
            locked.connecting.remove(key);
            if let Some(waiters) = locked.waiters.remove(key) {
                for waker in waiters {
                    waker.wake();
                }
            }
        }
    }
}

struct WeakOpt<T, K: Key>(Option<Weak<Mutex<PoolInner<T, K>>>>);

impl<T, K: Key> Clone for WeakOpt<T, K> {
    fn clone(&self) -> Self {
        WeakOpt(self.0.clone())
    }
}

impl<T: Poolable, K: Key> WeakOpt<T, K> {
    fn upgrade(&self) -> Option<Pool<T, K>> {
        self.0
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Pool { inner: Some(inner) })
    }
}

/// A connection checked out of, or about to be returned to, the pool.
///
/// Dropping a `Pooled` while it still holds an open connection returns it
/// to the pool for reuse; a closed connection is simply dropped.
pub(crate) struct Pooled<T: Poolable, K: Key> {
    key: Option<K>,
    is_reused: bool,
    pool: WeakOpt<T, K>,
    value: Option<T>,
}

impl<T: Poolable, K: Key> Pooled<T, K> {
    pub(crate) fn is_reused(&self) -> bool {
        self.is_reused
    }
}

impl<T: Poolable, K: Key> std::ops::Deref for Pooled<T, K> {
    type Target = T;
    fn deref(&self) -> &T {
        self.value.as_ref().expect("not yet dropped")
    }
}

impl<T: Poolable, K: Key> std::ops::DerefMut for Pooled<T, K> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("not yet dropped")
    }
}

impl<T: Poolable, K: Key> Drop for Pooled<T, K> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        if !value.is_open() {
            return;
        }
        let Some(key) = self.key.take() else {
            return;
        };
        if let Some(pool) = self.pool.upgrade() {
            pool.put(key, value);
        }
    }
}

impl<T: Poolable, K: Key> fmt::Debug for Pooled<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("is_reused", &self.is_reused)
            .finish()
    }
}

/// A held "connecting" lock for a key, released on drop.
pub(crate) struct Connecting<T: Poolable, K: Key> {
    key: Option<K>,
    pool: Pool<T, K>,
}

impl<T: Poolable, K: Key> Connecting<T, K> {
    /// Upgrade this lock to one for HTTP/2, after ALPN revealed the peer
    /// actually speaks h2.
    ///
    /// Returns `None` if another task already holds the HTTP/2 lock for
    /// this key; that task's connection will be shared instead.
    pub(crate) fn alpn_h2(mut self, pool: &Pool<T, K>) -> Option<Self> {
        let key = self.key.take()?;
        if let Some(ref inner) = pool.inner {
            let mut locked = inner.lock().unwrap();
            if !locked.connecting.insert(key.clone()) {
                return None;
            }
        }
        Some(Connecting {
            key: Some(key),
            pool: pool.clone(),
        })
    }
}

impl<T: Poolable, K: Key> Drop for Connecting<T, K> {
    fn drop(&mut self) {
        if let Some(ref key) = self.key {
            self.pool.connecting_done(key);
        }
    }
}

/// A future resolving to a ready idle connection for a key.
///
/// Never resolves on its own if no idle connection ever appears; callers
/// race it against a fresh connect via [`futures_util::future::select`] and
/// drop whichever loses.
pub(crate) struct Checkout<T: Poolable, K: Key> {
    key: K,
    pool: Pool<T, K>,
    parked: bool,
}

impl<T: Poolable, K: Key> Checkout<T, K> {
    fn poll_pooled(&mut self) -> Option<Pooled<T, K>> {
        loop {
            let entry = self.pool.take(&self.key)?;
            if let Some(ref inner) = self.pool.inner {
                let timeout = inner.lock().unwrap().timeout;
                if let Some(timeout) = timeout {
                    if entry.idle_at.elapsed() > timeout {
                        continue;
                    }
                }
            }
            if !entry.value.is_open() {
                continue;
            }
            return Some(Pooled {
                key: Some(self.key.clone()),
                is_reused: true,
                pool: self.pool.downgrade(),
                value: Some(entry.value),
            });
        }
    }
}

impl<T: Poolable, K: Key> Future for Checkout<T, K> {
    type Output = Result<Pooled<T, K>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(pooled) = this.poll_pooled() {
            return Poll::Ready(Ok(pooled));
        }
        if !this.parked {
            this.pool.park_waiter(&this.key, cx.waker().clone());
            this.parked = true;
        }
        Poll::Pending
    }
}

/// An error produced by a pool checkout.
///
/// The only kind today is a canceled checkout; there is nothing else a
/// checkout can fail with since it never observes connect errors directly.
pub(crate) struct Error {
    _priv: (),
}

impl Error {
    pub(crate) fn canceled() -> Self {
        Error { _priv: () }
    }

    pub(crate) fn is_canceled(&self) -> bool {
        true
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("pool::Error").finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection pool checkout canceled")
    }
}

impl std::error::Error for Error {}
