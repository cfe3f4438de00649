//! In-process response cache with per-request revalidation.
//!
//! Entries are keyed by method and URI only, so one user's cached response
//! is a candidate for every later request to the same URI. Before serving
//! an entry, every validation callback registered while the response was
//! produced is run against the new request; any `Invalid` sends the request
//! through the normal pipeline instead.
//!
//! Only cache routes whose body does not depend on who asked: revalidation
//! answers "may this requester see it", not "was it rendered for them".

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use warden_auth::{CachePolicy, CacheValidation, Revalidate};

use crate::app::errors;
use crate::bindings::RouteBindings;

/// Largest response body the cache will buffer.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Most entries held at once.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Larger responses, and responses of unknown size, pass through uncached.
    pub max_body_bytes: usize,
    /// When full, the entry closest to expiry is evicted.
    pub max_entries: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

type Callbacks = Vec<Arc<dyn Revalidate<Request>>>;

#[derive(Default)]
struct HookState {
    shared_max_age: Option<Duration>,
    callbacks: Callbacks,
}

/// Cache hooks for the request currently being produced.
///
/// Inserted into the request extensions by [`response_cache`] and handed to
/// the authorization filter as its [`CachePolicy`].
#[derive(Clone, Default)]
pub struct CacheHook {
    state: Arc<Mutex<HookState>>,
}

impl CacheHook {
    pub fn shared_max_age(&self) -> Option<Duration> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shared_max_age
    }

    fn take_callbacks(&self) -> Callbacks {
        std::mem::take(
            &mut self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks,
        )
    }
}

impl CachePolicy<Request> for CacheHook {
    fn set_shared_max_age(&self, max_age: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Keep the most restrictive value when several filters set it.
        state.shared_max_age = Some(match state.shared_max_age {
            Some(current) => current.min(max_age),
            None => max_age,
        });
    }

    fn add_validation_callback(&self, callback: Arc<dyn Revalidate<Request>>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .push(callback);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: Method,
    uri: String,
}

#[derive(Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    callbacks: Callbacks,
    expires_at: Instant,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    fn revalidate(&self, req: &Request) -> CacheValidation {
        if self
            .callbacks
            .iter()
            .all(|cb| cb.revalidate(req) == CacheValidation::Valid)
        {
            CacheValidation::Valid
        } else {
            CacheValidation::Invalid
        }
    }

    fn to_response(&self) -> Response {
        let mut res = Response::new(Body::from(self.body.clone()));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers.clone();
        res.headers_mut()
            .insert("x-cache", HeaderValue::from_static("hit"));
        res
    }
}

struct Inner {
    entries: Mutex<HashMap<CacheKey, CachedResponse>>,
    bindings: Arc<RouteBindings>,
    limits: CacheLimits,
}

/// Shared response cache. Cheap to clone.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Inner>,
}

impl ResponseCache {
    pub fn new(bindings: Arc<RouteBindings>) -> Self {
        Self::with_limits(bindings, CacheLimits::default())
    }

    pub fn with_limits(bindings: Arc<RouteBindings>, limits: CacheLimits) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                bindings,
                limits,
            }),
        }
    }

    /// Drop every entry. Returns how many were dropped.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries();
        let n = entries.len();
        entries.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CachedResponse>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &CacheKey, now: Instant) -> Option<CachedResponse> {
        let mut entries = self.entries();
        let entry = entries.get(key)?;
        if entry.is_fresh(now) {
            return Some(entry.clone());
        }
        entries.remove(key);
        None
    }

    /// Insert `entry`, first dropping everything expired at `now`.
    fn store(&self, key: CacheKey, entry: CachedResponse, now: Instant) {
        let mut entries = self.entries();
        entries.retain(|_, e| e.is_fresh(now));

        if entries.len() >= self.inner.limits.max_entries && !entries.contains_key(&key) {
            let soonest = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(soonest) = soonest {
                entries.remove(&soonest);
            }
        }
        entries.insert(key, entry);
    }

    /// Whether a response body can be buffered within the size limit.
    fn fits(&self, headers: &HeaderMap, body: &Body) -> bool {
        let max = self.inner.limits.max_body_bytes as u64;
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > max) {
            return false;
        }
        body.size_hint().upper().is_some_and(|upper| upper <= max)
    }
}

/// Merge a shared-cache max-age into an existing `Cache-Control` value.
///
/// Any previous `s-maxage` directive is replaced.
pub fn merge_shared_max_age(existing: Option<&str>, max_age: Duration) -> String {
    let mut directives: Vec<String> = existing
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            !d.split('=')
                .next()
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("s-maxage"))
        })
        .map(str::to_string)
        .collect();
    directives.push(format!("s-maxage={}", max_age.as_secs()));
    directives.join(", ")
}

/// Serve cacheable GET routes from [`ResponseCache`].
pub async fn response_cache(State(cache): State<ResponseCache>, mut req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }
    let Some(ttl) = cache
        .inner
        .bindings
        .resolve_request(&req)
        .and_then(|b| b.cache_ttl)
    else {
        return next.run(req).await;
    };

    let key = CacheKey {
        method: req.method().clone(),
        uri: req.uri().to_string(),
    };

    if let Some(entry) = cache.lookup(&key, Instant::now()) {
        // Callbacks run without the entries lock held.
        match entry.revalidate(&req) {
            CacheValidation::Valid => {
                tracing::debug!(uri = %key.uri, "serving cached response");
                return entry.to_response();
            }
            CacheValidation::Invalid => {
                tracing::info!(uri = %key.uri, "cached response rejected by revalidation");
                return next.run(req).await;
            }
        }
    }

    let hook = CacheHook::default();
    req.extensions_mut().insert(hook.clone());

    let res = next.run(req).await;
    let (mut parts, body) = res.into_parts();

    if let Some(max_age) = hook.shared_max_age() {
        let existing = parts
            .headers
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok());
        let merged = merge_shared_max_age(existing, max_age);
        match HeaderValue::from_str(&merged) {
            Ok(value) => {
                parts.headers.insert(header::CACHE_CONTROL, value);
            }
            Err(e) => tracing::warn!(error = %e, "invalid cache-control value"),
        }
    }

    if parts.status != StatusCode::OK {
        return Response::from_parts(parts, body);
    }
    if !cache.fits(&parts.headers, &body) {
        tracing::debug!(uri = %key.uri, "response too large or of unknown size; not cached");
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, cache.inner.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(uri = %key.uri, error = %e, "failed to buffer response for caching");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "response could not be buffered",
            );
        }
    };

    let now = Instant::now();
    cache.store(
        key,
        CachedResponse {
            status: parts.status,
            headers: parts.headers.clone(),
            body: bytes.clone(),
            callbacks: hook.take_callbacks(),
            expires_at: now + ttl,
        },
        now,
    );

    parts
        .headers
        .insert("x-cache", HeaderValue::from_static("miss"));
    Response::from_parts(parts, Body::from(bytes))
}
