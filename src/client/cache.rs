//! Response caching with in-flight request coalescing.
//!
//! The cache keys hydrated responses by request identity ([`CacheKey`]) and
//! guarantees at most one computation per key at a time: while a request is
//! in flight, every further lookup for the same key awaits the same shared
//! outcome instead of issuing its own request. The computation runs on a
//! detached task that also settles the slot, so the cache converges even if
//! every caller went away mid-request.
//!
//! Lifecycle of an entry:
//!
//! 1. miss: the compute future is spawned and the slot holds the shared
//!    in-flight handle;
//! 2. resolution: the flight task promotes a success to a ready value with
//!    a timestamp and removes the slot on an error (errors are never
//!    cached); callers only observe the outcome;
//! 3. expiry: ready values older than the configured TTL are dropped
//!    lazily on the next lookup;
//! 4. eviction: when a capacity is configured, the least recently used
//!    *resolved* entries are trimmed; in-flight slots are pinned so waiters
//!    never lose their handle.
//!
//! Promotion is guarded by a per-flight id: if the slot was invalidated or
//! replaced while the request ran, the stale result is returned to its
//! waiters but not stored.

use crate::config::CacheSettings;
use crate::error::{HalError, Result};
use crate::resource::Hydrated;
use crate::types::HttpMethod;
use crate::url::Params;
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Identity of a cacheable request: method, resolved URL, query parameters
/// and a hash of the body (zero when there is none).
///
/// Parameters are kept as the structural pair list, not a joined string: a
/// separator inside a value must not collide with two separate pairs. They
/// arrive already in their canonical serialization order, so two equivalent
/// requests produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: HttpMethod,
    url: String,
    params: Params,
    body_hash: u64,
}

impl CacheKey {
    /// Build the identity of a request.
    pub fn new(method: HttpMethod, url: &str, params: &Params, body: Option<&Value>) -> Self {
        let body_hash = match body {
            // serde_json serializes object keys in order, so equal values
            // hash equal regardless of how the caller built them.
            Some(value) => {
                let mut hasher = DefaultHasher::new();
                value.to_string().hash(&mut hasher);
                hasher.finish()
            }
            None => 0,
        };
        CacheKey {
            method,
            url: url.to_string(),
            params: params.clone(),
            body_hash,
        }
    }

    /// HTTP method of the request.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Resolved URL of the request, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }
}

type SharedOutcome = Shared<BoxFuture<'static, Result<Hydrated>>>;

enum CacheEntry {
    InFlight { id: u64, outcome: SharedOutcome },
    Ready { value: Hydrated, stored_at: Instant },
}

enum Lookup {
    Fresh(Hydrated),
    Join(SharedOutcome),
    Stale,
    Miss,
}

/// Hydrated-response cache with single-flight semantics.
///
/// The entry map is shared with the flight tasks, which settle their own
/// slot once the request resolves.
pub struct ResponseCache {
    entries: Arc<Mutex<LruCache<CacheKey, CacheEntry>>>,
    settings: CacheSettings,
    next_flight: AtomicU64,
}

impl ResponseCache {
    /// An empty cache honoring `settings` for TTL and capacity.
    pub fn new(settings: CacheSettings) -> Self {
        ResponseCache {
            entries: Arc::new(Mutex::new(LruCache::unbounded())),
            settings,
            next_flight: AtomicU64::new(1),
        }
    }

    /// Return the cached value for `key` or compute it.
    ///
    /// On a miss, `compute` is called once to build the request future,
    /// which then runs on a detached task; concurrent lookups for the same
    /// key share its outcome. The task settles the slot itself once the
    /// request resolves (store on success, remove on failure), so cleanup
    /// does not depend on any waiter staying around to see the result.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<Hydrated>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Hydrated>> + Send + 'static,
    {
        let outcome = {
            let mut entries = self.entries.lock();
            let lookup = match entries.get(&key) {
                Some(CacheEntry::Ready { value, stored_at }) => {
                    if self.is_fresh(*stored_at) {
                        Lookup::Fresh(value.clone())
                    } else {
                        Lookup::Stale
                    }
                }
                Some(CacheEntry::InFlight { outcome, .. }) => Lookup::Join(outcome.clone()),
                None => Lookup::Miss,
            };
            match lookup {
                Lookup::Fresh(value) => {
                    tracing::debug!(url = %key.url(), "cache hit");
                    return Ok(value);
                }
                Lookup::Join(outcome) => {
                    drop(entries);
                    tracing::debug!(url = %key.url(), "joining in-flight request");
                    return outcome.await;
                }
                Lookup::Stale => {
                    tracing::debug!(url = %key.url(), "cache entry expired");
                    entries.pop(&key);
                }
                Lookup::Miss => {}
            }

            let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
            let method = key.method().to_string();
            let url = key.url().to_string();
            // The request runs on its own task so a panic reaches the
            // flight as a join error instead of unwinding into a waiter.
            let request = tokio::spawn(compute());
            let slots = Arc::clone(&self.entries);
            let slot_key = key.clone();
            let flight_method = method.clone();
            let flight_url = url.clone();
            // The flight owns its slot. It cannot touch the map before the
            // entry below is in place: the lock is held until this block
            // ends.
            let flight = tokio::spawn(async move {
                let result = match request.await {
                    Ok(result) => result,
                    Err(err) => Err(HalError::RequestFailed {
                        method: flight_method,
                        url: flight_url,
                        status: None,
                        reason: format!("request task failed: {err}"),
                    }),
                };
                let mut slots = slots.lock();
                // Settle only if this flight still owns the slot; an
                // invalidation may have raced the request.
                let owns_slot = matches!(
                    slots.peek(&slot_key),
                    Some(CacheEntry::InFlight { id: owner, .. }) if *owner == id
                );
                if owns_slot {
                    match &result {
                        Ok(value) => {
                            slots.put(
                                slot_key,
                                CacheEntry::Ready {
                                    value: value.clone(),
                                    stored_at: Instant::now(),
                                },
                            );
                        }
                        Err(_) => {
                            slots.pop(&slot_key);
                        }
                    }
                }
                drop(slots);
                result
            });
            let outcome: SharedOutcome = async move {
                match flight.await {
                    Ok(result) => result,
                    Err(err) => Err(HalError::RequestFailed {
                        method,
                        url,
                        status: None,
                        reason: format!("request task failed: {err}"),
                    }),
                }
            }
            .boxed()
            .shared();
            entries.put(
                key,
                CacheEntry::InFlight {
                    id,
                    outcome: outcome.clone(),
                },
            );
            self.trim(&mut entries);
            outcome
        };

        outcome.await
    }

    /// Drop the entry for one request identity.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().pop(key);
    }

    /// Drop every entry whose URL is a prefix of `url` or has `url` as a
    /// prefix.
    ///
    /// Used after mutations: writing `…/orders/1` stales both the resource
    /// itself and any cached collection at `…/orders`, and writing a
    /// collection root stales its members.
    pub fn invalidate_related(&self, url: &str) {
        let mut entries = self.entries.lock();
        let doomed: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.url.starts_with(url) || url.starts_with(key.url.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        if !doomed.is_empty() {
            tracing::debug!(url, evicted = doomed.len(), "invalidated related cache entries");
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, resolved and in flight.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entry at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, stored_at: Instant) -> bool {
        match self.settings.ttl() {
            Some(ttl) => stored_at.elapsed() < ttl,
            None => true,
        }
    }

    fn trim(&self, entries: &mut LruCache<CacheKey, CacheEntry>) {
        let Some(max) = self.settings.max_entries else {
            return;
        };
        while entries.len() > max {
            // Evict the least recently used resolved entry. In-flight
            // slots stay: waiters hold their handle through the cache.
            let victim = entries
                .iter()
                .rev()
                .find(|(_, entry)| matches!(entry, CacheEntry::Ready { .. }))
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    entries.pop(&key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn key(url: &str) -> CacheKey {
        CacheKey::new(HttpMethod::Get, url, &Vec::new(), None)
    }

    fn payload(tag: &str) -> Hydrated {
        Hydrated::Raw(json!({ "tag": tag }))
    }

    #[test]
    fn test_key_identity() {
        let params = vec![("size".to_string(), "20".to_string())];
        let a = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &params, None);
        let b = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &params, None);
        assert_eq!(a, b);

        let with_body = CacheKey::new(
            HttpMethod::Get,
            "http://h/api/orders",
            &params,
            Some(&json!({"q": 1})),
        );
        assert_ne!(a, with_body);

        let other_method = CacheKey::new(HttpMethod::Post, "http://h/api/orders", &params, None);
        assert_ne!(a, other_method);
    }

    #[test]
    fn test_separator_inside_a_value_keeps_keys_distinct() {
        // One value that happens to contain "&...=" is not the same request
        // as two separate parameters.
        let joined = vec![("a".to_string(), "1&b=2".to_string())];
        let split = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        let one = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &joined, None);
        let two = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &split, None);
        assert_ne!(one, two);
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let cache = ResponseCache::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let got = cache
                .get_or_compute(key("http://h/a"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(payload("a"))
                })
                .await
                .unwrap();
            assert_eq!(got.as_raw().unwrap()["tag"], json!("a"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_flight() {
        let cache = ResponseCache::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_calls = Arc::clone(&calls);
        let first = cache.get_or_compute(key("http://h/a"), move || async move {
            slow_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(payload("first"))
        });
        let late_calls = Arc::clone(&calls);
        let second = cache.get_or_compute(key("http://h/a"), move || async move {
            late_calls.fetch_add(1, Ordering::SeqCst);
            Ok(payload("second"))
        });

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap().as_raw().unwrap()["tag"], json!("first"));
        assert_eq!(b.unwrap().as_raw().unwrap()["tag"], json!("first"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ResponseCache::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let failing_calls = Arc::clone(&calls);
        let err = cache
            .get_or_compute(key("http://h/a"), move || async move {
                failing_calls.fetch_add(1, Ordering::SeqCst);
                Err(HalError::RequestFailed {
                    method: "GET".into(),
                    url: "http://h/a".into(),
                    status: Some(500),
                    reason: "HTTP 500".into(),
                })
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(cache.is_empty());

        let ok_calls = Arc::clone(&calls);
        cache
            .get_or_compute(key("http://h/a"), move || async move {
                ok_calls.fetch_add(1, Ordering::SeqCst);
                Ok(payload("recovered"))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_pin_a_failed_flight() {
        let cache = ResponseCache::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let failing_calls = Arc::clone(&calls);
        let lookup = cache.get_or_compute(key("http://h/a"), move || async move {
            failing_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(HalError::RequestFailed {
                method: "GET".into(),
                url: "http://h/a".into(),
                status: Some(500),
                reason: "HTTP 500".into(),
            })
        });
        // The caller gives up before the request resolves.
        let gave_up = tokio::time::timeout(Duration::from_millis(10), lookup).await;
        assert!(gave_up.is_err());

        // The detached flight still resolves and removes the failed slot.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty());

        let ok_calls = Arc::clone(&calls);
        let got = cache
            .get_or_compute(key("http://h/a"), move || async move {
                ok_calls.fetch_add(1, Ordering::SeqCst);
                Ok(payload("recovered"))
            })
            .await
            .unwrap();
        assert_eq!(got.as_raw().unwrap()["tag"], json!("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_flight_settles_after_every_caller_is_gone() {
        let cache = ResponseCache::new(CacheSettings::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_calls = Arc::clone(&calls);
        let lookup = cache.get_or_compute(key("http://h/a"), move || async move {
            slow_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(payload("late"))
        });
        let gave_up = tokio::time::timeout(Duration::from_millis(10), lookup).await;
        assert!(gave_up.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len(), 1);

        // The flight promoted its result without any waiter; the next
        // lookup is a plain hit.
        let hit_calls = Arc::clone(&calls);
        let got = cache
            .get_or_compute(key("http://h/a"), move || async move {
                hit_calls.fetch_add(1, Ordering::SeqCst);
                Ok(payload("other"))
            })
            .await
            .unwrap();
        assert_eq!(got.as_raw().unwrap()["tag"], json!("late"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = ResponseCache::new(CacheSettings {
            ttl_ms: Some(30),
            max_entries: None,
        });
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            cache
                .get_or_compute(key("http://h/a"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(payload("a"))
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = ResponseCache::new(CacheSettings {
            ttl_ms: None,
            max_entries: Some(2),
        });

        for url in ["http://h/a", "http://h/b", "http://h/c"] {
            cache
                .get_or_compute(key(url), move || async move { Ok(payload(url)) })
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 2);

        // The oldest entry is gone; looking it up computes again.
        let calls = Arc::new(AtomicUsize::new(0));
        let recompute_calls = Arc::clone(&calls);
        cache
            .get_or_compute(key("http://h/a"), move || async move {
                recompute_calls.fetch_add(1, Ordering::SeqCst);
                Ok(payload("a"))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicked_computation_surfaces_as_request_failed() {
        let cache = ResponseCache::new(CacheSettings::default());
        let err = cache
            .get_or_compute(key("http://h/a"), || async { panic!("boom") })
            .await
            .unwrap_err();
        match err {
            HalError::RequestFailed { reason, status, .. } => {
                assert!(reason.contains("task"));
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_related_matches_prefixes_both_ways() {
        let cache = ResponseCache::new(CacheSettings::default());
        for url in [
            "http://h/api/orders",
            "http://h/api/orders/1",
            "http://h/api/customers",
        ] {
            cache
                .get_or_compute(key(url), move || async move { Ok(payload(url)) })
                .await
                .unwrap();
        }

        cache.invalidate_related("http://h/api/orders/1");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
