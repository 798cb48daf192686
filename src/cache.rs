//! RFC 7234 response caching.
//!
//! A [`Cache`] consults a store keyed by the canonical request URL before a request
//! hits the network, and writes eligible responses back after. Caching never fails a
//! call: storage errors are logged at `warn!` and the request falls through to the
//! network as if no cache were configured.

use std::{
    collections::HashMap,
    fmt,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock},
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, Version};

/// Parsed `Cache-Control` directives, usable on both requests and responses.
///
/// Built via [`CacheControl::builder`], mirroring the rest of the crate's DSL builders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub(crate) no_store: bool,
    pub(crate) no_cache: bool,
    pub(crate) private: bool,
    pub(crate) must_revalidate: bool,
    pub(crate) immutable: bool,
    pub(crate) no_transform: bool,
    pub(crate) max_age: Option<Duration>,
    pub(crate) s_maxage: Option<Duration>,
    pub(crate) only_if_cached: bool,
}

impl CacheControl {
    /// Creates a new [`CacheControlBuilder`].
    pub fn builder() -> CacheControlBuilder {
        CacheControlBuilder {
            control: CacheControl::default(),
        }
    }

    /// Parses the directives carried by a `Cache-Control` header (request or response).
    pub(crate) fn from_headers(headers: &HeaderMap) -> CacheControl {
        let mut control = CacheControl::default();
        for value in headers.get_all(http::header::CACHE_CONTROL) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for directive in value.split(',') {
                let directive = directive.trim();
                let mut parts = directive.splitn(2, '=');
                let name = parts.next().unwrap_or("").trim().to_ascii_lowercase();
                let arg = parts.next().map(|s| s.trim().trim_matches('"'));
                match name.as_str() {
                    "no-store" => control.no_store = true,
                    "no-cache" => control.no_cache = true,
                    "private" => control.private = true,
                    "must-revalidate" => control.must_revalidate = true,
                    "immutable" => control.immutable = true,
                    "no-transform" => control.no_transform = true,
                    "only-if-cached" => control.only_if_cached = true,
                    "max-age" => {
                        control.max_age = arg.and_then(|s| s.parse::<u64>().ok()).map(Duration::from_secs);
                    }
                    "s-maxage" => {
                        control.s_maxage = arg.and_then(|s| s.parse::<u64>().ok()).map(Duration::from_secs);
                    }
                    _ => {}
                }
            }
        }
        control
    }

    /// Whether the response this was parsed from must never be stored.
    pub fn no_store(&self) -> bool {
        self.no_store
    }

    /// Whether a cached copy must always be revalidated before use.
    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    /// The freshness lifetime, if a `max-age` directive was present.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }
}

/// Builder for [`CacheControl`].
#[must_use]
#[derive(Debug, Default)]
pub struct CacheControlBuilder {
    control: CacheControl,
}

impl CacheControlBuilder {
    /// Marks the response as never eligible for storage.
    pub fn no_store(mut self, value: bool) -> Self {
        self.control.no_store = value;
        self
    }

    /// Requires revalidation before every use of a stored copy.
    pub fn no_cache(mut self, value: bool) -> Self {
        self.control.no_cache = value;
        self
    }

    /// Marks the response as not intended for shared caches.
    ///
    /// This client only ever acts as a private cache, so `private` does not by
    /// itself prevent storage here; it is kept for interoperable header output.
    pub fn private(mut self, value: bool) -> Self {
        self.control.private = value;
        self
    }

    /// Requires that a stale entry is never served without successful revalidation.
    pub fn must_revalidate(mut self, value: bool) -> Self {
        self.control.must_revalidate = value;
        self
    }

    /// Marks the response body as guaranteed not to change for its freshness lifetime.
    pub fn immutable(mut self, value: bool) -> Self {
        self.control.immutable = value;
        self
    }

    /// Sets the freshness lifetime.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.control.max_age = Some(max_age);
        self
    }

    /// Builds the [`CacheControl`].
    pub fn build(self) -> CacheControl {
        self.control
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.no_store {
            parts.push("no-store".to_string());
        }
        if self.no_cache {
            parts.push("no-cache".to_string());
        }
        if self.private {
            parts.push("private".to_string());
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        if self.immutable {
            parts.push("immutable".to_string());
        }
        if self.no_transform {
            parts.push("no-transform".to_string());
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={}", max_age.as_secs()));
        }
        if let Some(s_maxage) = self.s_maxage {
            parts.push(format!("s-maxage={}", s_maxage.as_secs()));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Whether a cached entry can still be served without contacting the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Freshness {
    /// May be served as-is.
    Fresh,
    /// Must be revalidated; carries whether a validator is available.
    Stale { has_validator: bool },
}

/// A captured response, persisted or held in memory, keyed by canonical request URL.
#[derive(Clone)]
pub(crate) struct CachedResponse {
    pub(crate) uri: Uri,
    pub(crate) request_method: Method,
    /// The subset of request headers named by this response's `Vary`, as sent originally.
    pub(crate) varying_request_headers: HeaderMap,
    pub(crate) version: Version,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) tls_peer_certificate: Option<Vec<u8>>,
    pub(crate) requested_at: SystemTime,
    pub(crate) received_at: SystemTime,
}

impl CachedResponse {
    fn cache_control(&self) -> CacheControl {
        CacheControl::from_headers(&self.headers)
    }

    fn vary_names(&self) -> Vec<HeaderName> {
        self.headers
            .get_all(http::header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|name| name.trim().parse::<HeaderName>().ok())
            .collect()
    }

    /// Whether `request_headers` matches the headers this entry was stored with, per `Vary`.
    pub(crate) fn matches_vary(&self, request_headers: &HeaderMap) -> bool {
        self.vary_names().iter().all(|name| {
            self.varying_request_headers.get(name) == request_headers.get(name)
        })
    }

    pub(crate) fn freshness(&self, now: SystemTime) -> Freshness {
        let control = self.cache_control();
        let age = now
            .duration_since(self.received_at)
            .unwrap_or(Duration::ZERO);
        let fresh = match control.max_age {
            Some(max_age) => age < max_age,
            None => false,
        };
        if fresh && !control.no_cache {
            Freshness::Fresh
        } else {
            let has_validator =
                self.headers.contains_key(http::header::ETAG) || self.headers.contains_key(http::header::LAST_MODIFIED);
            Freshness::Stale { has_validator }
        }
    }

    /// Builds the conditional request headers (`If-None-Match`/`If-Modified-Since`) used to
    /// revalidate this entry.
    pub(crate) fn conditional_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(etag) = self.headers.get(http::header::ETAG) {
            headers.insert(http::header::IF_NONE_MATCH, etag.clone());
        }
        if let Some(last_modified) = self.headers.get(http::header::LAST_MODIFIED) {
            headers.insert(http::header::IF_MODIFIED_SINCE, last_modified.clone());
        }
        headers
    }

    /// Merges a `304 Not Modified` response's headers into this entry's stored headers,
    /// with the network response's headers winning on conflicts, per RFC 7234 §4.3.4.
    pub(crate) fn merge_304(&mut self, network_headers: &HeaderMap) {
        for name in network_headers.keys() {
            self.headers.remove(name);
            for value in network_headers.get_all(name) {
                self.headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// Pluggable storage backend for cached responses.
///
/// Implementations must be safe to share across threads; the cache consults the
/// store from whichever worker is driving a given call.
pub trait CacheStore: Send + Sync {
    /// Looks up the entry for `key`, the canonical request URL.
    fn get(&self, key: &str) -> Option<CachedResponse>;

    /// Stores (or replaces) the entry for `key`.
    fn put(&self, key: &str, entry: CachedResponse);

    /// Removes the entry for `key`, if any (e.g. on successful `POST`/`PUT`/`DELETE`).
    fn remove(&self, key: &str);
}

/// A bounded in-memory cache store.
///
/// Entries beyond `max_entries` are evicted in arbitrary (insertion-adjacent) order;
/// this is meant for short-lived processes and tests rather than long-running
/// deployments, which should use [`DiskCache`].
pub struct MemoryCache {
    max_entries: usize,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl MemoryCache {
    /// Creates a new, empty in-memory store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        MemoryCache {
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, entry: CachedResponse) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            if let Some(evict) = entries.keys().next().cloned() {
                entries.remove(&evict);
            }
        }
        entries.insert(key.to_owned(), entry);
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// A disk-backed cache store.
///
/// Each entry is persisted as a pair of files, `<hash>.meta` (a small text format: URL,
/// method, varying headers, protocol, status line, response headers, TLS leaf certificate,
/// and timestamps) and `<hash>.body` (raw bytes, pre-decompression), named by the SHA-256
/// hash of the canonical request URL. Writes go to a temporary file followed by a rename,
/// so a reader never observes a half-written entry. An append-only journal records writes
/// and removals for crash recovery; [`DiskCache::compact`] rewrites it to just the
/// currently-live keys.
pub struct DiskCache {
    dir: PathBuf,
    journal: Mutex<fs::File>,
    index: RwLock<HashMap<String, ()>>,
}

impl DiskCache {
    /// Opens (creating if needed) a disk cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let journal = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("journal"))?;

        let mut index = HashMap::new();
        if let Ok(contents) = fs::read_to_string(dir.join("journal")) {
            for line in contents.lines() {
                if let Some(key) = line.strip_prefix("PUT ") {
                    index.insert(key.to_owned(), ());
                } else if let Some(key) = line.strip_prefix("REMOVE ") {
                    index.remove(key);
                }
            }
        }

        Ok(DiskCache {
            dir,
            journal: Mutex::new(journal),
            index: RwLock::new(index),
        })
    }

    fn path_for(&self, key: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", hash_key(key), ext))
    }

    fn append_journal(&self, line: &str) {
        if let Ok(mut journal) = self.journal.lock() {
            let _ = writeln!(journal, "{line}");
        }
    }

    /// Rewrites the journal to contain only currently-live keys.
    pub fn compact(&self) -> io::Result<()> {
        let Ok(index) = self.index.read() else {
            return Ok(());
        };
        let tmp = self.dir.join("journal.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            for key in index.keys() {
                writeln!(file, "PUT {key}")?;
            }
        }
        fs::rename(&tmp, self.dir.join("journal"))?;
        *self.journal.lock().map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned"))? =
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.dir.join("journal"))?;
        Ok(())
    }

    fn write_entry(&self, key: &str, entry: &CachedResponse) -> io::Result<()> {
        let meta_path = self.path_for(key, "meta");
        let body_path = self.path_for(key, "body");
        let meta_tmp = meta_path.with_extension("meta.tmp");
        let body_tmp = body_path.with_extension("body.tmp");

        fs::write(&body_tmp, &entry.body)?;
        fs::write(&meta_tmp, encode_metadata(entry))?;

        fs::rename(&body_tmp, &body_path)?;
        fs::rename(&meta_tmp, &meta_path)?;
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Option<CachedResponse> {
        let meta_path = self.path_for(key, "meta");
        let body_path = self.path_for(key, "body");

        let mut meta_text = String::new();
        fs::File::open(&meta_path).ok()?.read_to_string(&mut meta_text).ok()?;
        let body = fs::read(&body_path).ok()?;

        decode_metadata(&meta_text, Bytes::from(body))
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        if !self.index.read().ok()?.contains_key(key) {
            return None;
        }
        self.read_entry(key)
    }

    fn put(&self, key: &str, entry: CachedResponse) {
        if self.write_entry(key, &entry).is_err() {
            log::warn!("cache: failed to persist entry for {}", entry.uri);
            return;
        }
        if let Ok(mut index) = self.index.write() {
            index.insert(key.to_owned(), ());
        }
        self.append_journal(&format!("PUT {key}"));
    }

    fn remove(&self, key: &str) {
        if let Ok(mut index) = self.index.write() {
            index.remove(key);
        }
        let _ = fs::remove_file(self.path_for(key, "meta"));
        let _ = fs::remove_file(self.path_for(key, "body"));
        self.append_journal(&format!("REMOVE {key}"));
    }
}

fn hash_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn system_time_to_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn secs_to_system_time(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Encodes a [`CachedResponse`] as the on-disk `.meta` text format: one directive per line,
/// `name\tvalue`, with repeated `header` lines for each response header.
fn encode_metadata(entry: &CachedResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("uri\t{}\n", entry.uri));
    out.push_str(&format!("method\t{}\n", entry.request_method));
    out.push_str(&format!("version\t{:?}\n", entry.version));
    out.push_str(&format!("status\t{}\n", entry.status.as_u16()));
    out.push_str(&format!("requested_at\t{}\n", system_time_to_secs(entry.requested_at)));
    out.push_str(&format!("received_at\t{}\n", system_time_to_secs(entry.received_at)));
    if let Some(cert) = &entry.tls_peer_certificate {
        out.push_str(&format!("tls_cert\t{}\n", base64_encode(cert)));
    }
    for (name, value) in entry.headers.iter() {
        if let Ok(value) = value.to_str() {
            out.push_str(&format!("header\t{}\t{}\n", name.as_str(), value));
        }
    }
    for (name, value) in entry.varying_request_headers.iter() {
        if let Ok(value) = value.to_str() {
            out.push_str(&format!("vary-header\t{}\t{}\n", name.as_str(), value));
        }
    }
    out
}

fn decode_metadata(text: &str, body: Bytes) -> Option<CachedResponse> {
    let mut uri = None;
    let mut method = None;
    let mut version = Version::HTTP_11;
    let mut status = None;
    let mut requested_at = SystemTime::now();
    let mut received_at = SystemTime::now();
    let mut tls_peer_certificate = None;
    let mut headers = HeaderMap::new();
    let mut varying_request_headers = HeaderMap::new();

    for line in text.lines() {
        let mut parts = line.splitn(3, '\t');
        match parts.next()? {
            "uri" => uri = parts.next().and_then(|s| s.parse::<Uri>().ok()),
            "method" => method = parts.next().and_then(|s| s.parse::<Method>().ok()),
            "version" => {
                version = match parts.next()? {
                    "HTTP/0.9" => Version::HTTP_09,
                    "HTTP/1.0" => Version::HTTP_10,
                    "HTTP/2.0" => Version::HTTP_2,
                    "HTTP/3.0" => Version::HTTP_3,
                    _ => Version::HTTP_11,
                }
            }
            "status" => status = parts.next().and_then(|s| s.parse::<u16>().ok()).and_then(|s| StatusCode::from_u16(s).ok()),
            "requested_at" => requested_at = parts.next().and_then(|s| s.parse::<u64>().ok()).map(secs_to_system_time)?,
            "received_at" => received_at = parts.next().and_then(|s| s.parse::<u64>().ok()).map(secs_to_system_time)?,
            "tls_cert" => tls_peer_certificate = parts.next().and_then(base64_decode),
            "header" => {
                let name = parts.next()?;
                let value = parts.next().unwrap_or("");
                if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
                    headers.append(name, value);
                }
            }
            "vary-header" => {
                let name = parts.next()?;
                let value = parts.next().unwrap_or("");
                if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
                    varying_request_headers.append(name, value);
                }
            }
            _ => {}
        }
    }

    Some(CachedResponse {
        uri: uri?,
        request_method: method?,
        varying_request_headers,
        version,
        status: status?,
        headers,
        body,
        tls_peer_certificate,
        requested_at,
        received_at,
    })
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::{Engine, prelude::BASE64_STANDARD};
    BASE64_STANDARD.encode(bytes)
}

fn base64_decode(s: &str) -> Option<Vec<u8>> {
    use base64::{Engine, prelude::BASE64_STANDARD};
    BASE64_STANDARD.decode(s).ok()
}

/// Computes the cache key (the canonical request URL) for a `GET` request.
pub(crate) fn cache_key(uri: &Uri) -> String {
    uri.to_string()
}

/// A response cache, consulted by the cache interceptor before a request reaches the
/// network.
///
/// Wraps a pluggable [`CacheStore`]; construct one with [`Cache::in_memory`] or
/// [`Cache::disk`] and hand it to [`ClientBuilder::cache`](crate::ClientBuilder::cache).
#[derive(Clone)]
pub struct Cache {
    pub(crate) store: Arc<dyn CacheStore>,
}

impl Cache {
    /// Wraps an arbitrary [`CacheStore`] implementation.
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Cache {
            store: Arc::new(store),
        }
    }

    /// A bounded in-memory cache holding at most `max_entries` entries.
    pub fn in_memory(max_entries: usize) -> Self {
        Cache::new(MemoryCache::new(max_entries))
    }

    /// A disk-backed cache rooted at `dir`, created if it does not exist.
    pub fn disk(dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Cache::new(DiskCache::open(dir.as_ref())?))
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(uri: &str, max_age_secs: u64) -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CACHE_CONTROL,
            HeaderValue::from_str(&format!("max-age={max_age_secs}")).unwrap(),
        );
        headers.insert(http::header::ETAG, HeaderValue::from_static("\"v1\""));
        CachedResponse {
            uri: uri.parse().unwrap(),
            request_method: Method::GET,
            varying_request_headers: HeaderMap::new(),
            version: Version::HTTP_11,
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"hello"),
            tls_peer_certificate: None,
            requested_at: SystemTime::now(),
            received_at: SystemTime::now(),
        }
    }

    #[test]
    fn cache_control_parses_max_age() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=120, must-revalidate"),
        );
        let control = CacheControl::from_headers(&headers);
        assert_eq!(control.max_age, Some(Duration::from_secs(120)));
        assert!(control.must_revalidate);
    }

    #[test]
    fn fresh_entry_is_fresh() {
        let entry = sample("https://example.com/a", 3600);
        assert_eq!(entry.freshness(SystemTime::now()), Freshness::Fresh);
    }

    #[test]
    fn expired_entry_is_stale_with_validator() {
        let entry = sample("https://example.com/a", 0);
        let later = SystemTime::now() + Duration::from_secs(5);
        assert_eq!(
            entry.freshness(later),
            Freshness::Stale { has_validator: true }
        );
    }

    #[test]
    fn merge_304_prefers_network_headers() {
        let mut entry = sample("https://example.com/a", 3600);
        let mut network = HeaderMap::new();
        network.insert(http::header::ETAG, HeaderValue::from_static("\"v2\""));
        entry.merge_304(&network);
        assert_eq!(entry.headers.get(http::header::ETAG).unwrap(), "\"v2\"");
    }

    #[test]
    fn memory_cache_round_trips() {
        let store = MemoryCache::new(4);
        store.put("k", sample("https://example.com/a", 3600));
        assert!(store.get("k").is_some());
        store.remove("k");
        assert!(store.get("k").is_none());
    }

    #[test]
    fn disk_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskCache::open(dir.path()).unwrap();
        store.put("k", sample("https://example.com/a", 3600));
        let got = store.get("k").expect("entry persisted");
        assert_eq!(got.body, Bytes::from_static(b"hello"));
        assert_eq!(got.status, StatusCode::OK);
        store.remove("k");
        assert!(store.get("k").is_none());
    }
}
