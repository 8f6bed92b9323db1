//! Expiring caches for provider reference data.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::sync::RwLock;

use crate::error::Result;

/// A value read from a [`TtlCache`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Within the TTL, or just refreshed
    Fresh(T),
    /// Past the TTL; served because a refresh failed
    Stale(T),
}

impl<T> CacheLookup<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheLookup::Stale(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            CacheLookup::Fresh(value) | CacheLookup::Stale(value) => value,
        }
    }
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn lookup(&self, ttl: Duration) -> CacheLookup<T> {
        if self.stored_at.elapsed() < ttl {
            CacheLookup::Fresh(self.value.clone())
        } else {
            CacheLookup::Stale(self.value.clone())
        }
    }
}

/// Holds one value for `ttl`. An expired value is kept so it can be served
/// when the refresh fails.
pub struct TtlCache<T> {
    name: String,
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current value, fresh or stale, without refreshing.
    pub async fn get(&self) -> Option<CacheLookup<T>> {
        let guard = self.entry.read().await;
        guard.as_ref().map(|entry| entry.lookup(self.ttl))
    }

    pub async fn put(&self, value: T) {
        *self.entry.write().await = Some(Entry::new(value));
    }

    /// Serve a fresh value, refreshing through `refresh` when expired or
    /// empty. A failed refresh falls back to the stale value if one exists.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<CacheLookup<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let stale = match self.get().await {
            Some(CacheLookup::Fresh(value)) => {
                debug!("{} cache hit", self.name);
                return Ok(CacheLookup::Fresh(value));
            }
            Some(CacheLookup::Stale(value)) => Some(value),
            None => None,
        };

        match refresh().await {
            Ok(value) => {
                self.put(value.clone()).await;
                debug!("{} cache refreshed for {:?}", self.name, self.ttl);
                Ok(CacheLookup::Fresh(value))
            }
            Err(err) => match stale {
                Some(value) => {
                    warn!("{} refresh failed, serving stale copy: {}", self.name, err);
                    Ok(CacheLookup::Stale(value))
                }
                None => Err(err),
            },
        }
    }
}

/// Per-key variant of [`TtlCache`] for lookups such as airports by code.
/// Only successful refreshes are stored.
pub struct KeyedTtlCache<T> {
    name: String,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T: Clone> KeyedTtlCache<T> {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<CacheLookup<T>> {
        let guard = self.entries.read().await;
        guard.get(key).map(|entry| entry.lookup(self.ttl))
    }

    pub async fn put(&self, key: impl Into<String>, value: T) {
        self.entries.write().await.insert(key.into(), Entry::new(value));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Same contract as [`TtlCache::get_or_refresh`], per key.
    pub async fn get_or_refresh<F, Fut>(&self, key: &str, refresh: F) -> Result<CacheLookup<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let stale = match self.get(key).await {
            Some(CacheLookup::Fresh(value)) => {
                debug!("{} cache hit for {}", self.name, key);
                return Ok(CacheLookup::Fresh(value));
            }
            Some(CacheLookup::Stale(value)) => Some(value),
            None => None,
        };

        match refresh().await {
            Ok(value) => {
                self.put(key, value.clone()).await;
                Ok(CacheLookup::Fresh(value))
            }
            Err(err) => match stale {
                Some(value) => {
                    warn!("{} refresh for {} failed, serving stale copy: {}", self.name, key, err);
                    Ok(CacheLookup::Stale(value))
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fresh_hit_skips_refresh() {
        let cache = TtlCache::new("airlines", Duration::from_secs(60));
        cache.put(vec!["UA"]).await;

        let calls = AtomicUsize::new(0);
        let value = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["AA"])
            })
            .await
            .unwrap();

        assert_eq!(value, CacheLookup::Fresh(vec!["UA"]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_cache_refreshes() {
        let cache: TtlCache<u32> = TtlCache::new("numbers", Duration::from_secs(60));
        let value = cache.get_or_refresh(|| async { Ok(7) }).await.unwrap();
        assert_eq!(value, CacheLookup::Fresh(7));
        assert_eq!(cache.get().await, Some(CacheLookup::Fresh(7)));
    }

    #[tokio::test]
    async fn test_expired_value_is_served_stale_on_failure() {
        let cache = TtlCache::new("airlines", Duration::from_millis(10));
        cache.put("cached".to_string()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get().await.unwrap().is_stale());

        let value = cache
            .get_or_refresh(|| async { Err(ServiceError::network("provider down")) })
            .await
            .unwrap();
        assert!(value.is_stale());
        assert_eq!(value.into_inner(), "cached");
    }

    #[tokio::test]
    async fn test_failure_without_copy_is_an_error() {
        let cache: TtlCache<String> = TtlCache::new("airlines", Duration::from_secs(60));
        let result = cache
            .get_or_refresh(|| async { Err(ServiceError::network("provider down")) })
            .await;
        assert!(result.is_err());
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_keyed_cache_refreshes_per_key_and_skips_failures() {
        let cache: KeyedTtlCache<String> = KeyedTtlCache::new("airports", Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_refresh("SFO", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("San Francisco".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, CacheLookup::Fresh("San Francisco".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let missing = cache
            .get_or_refresh("QQQ", || async { Err(ServiceError::not_found("QQQ")) })
            .await;
        assert!(missing.is_err());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_keyed_cache_serves_stale_entry_on_failure() {
        let cache = KeyedTtlCache::new("airports", Duration::from_millis(10));
        cache.put("LAX", 1u32).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let value = cache
            .get_or_refresh("LAX", || async { Err(ServiceError::network("provider down")) })
            .await
            .unwrap();
        assert_eq!(value, CacheLookup::Stale(1));
    }
}
