//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::Result;

use super::storage::CacheStorage;
use super::traits::{CacheResult, Cacheable, QueryKey};

type FlightGate = Arc<AsyncMutex<()>>;

/// Cache layer that manages TTL freshness, request de-duplication and
/// network fetching.
///
/// Reads go cache-first: a fresh entry is returned without touching the
/// network; a miss or expired entry triggers a full refetch whose result
/// replaces the entry wholesale. Concurrent callers that miss on the same
/// key are single-flighted: one fetch runs, the rest wait and re-read the
/// cache once it lands.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// One gate per in-flight cache key
  inflight: Arc<StdMutex<HashMap<String, FlightGate>>>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      inflight: Arc::new(StdMutex::new(HashMap::new())),
    }
  }

  /// Check if cached data is expired for the given TTL.
  fn is_stale(cached_at: DateTime<Utc>, ttl: Duration) -> bool {
    Utc::now() - cached_at > ttl
  }

  /// Clear one entity type, or everything.
  pub fn invalidate(&self, entity_type: Option<&str>) {
    match entity_type {
      Some(t) => self.storage.invalidate_type(t),
      None => self.storage.invalidate_all(),
    }
  }

  /// Drop a single cached query result.
  pub fn invalidate_query<K: QueryKey>(&self, key: &K) {
    self.storage.invalidate_query(&key.cache_hash());
  }

  /// Acquire the in-flight gate for `hash`, or None if another caller
  /// holds it (i.e. a fetch for this key is already running).
  fn try_lead(&self, hash: &str) -> (FlightGate, Option<tokio::sync::OwnedMutexGuard<()>>) {
    let gate = {
      let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
      inflight
        .entry(hash.to_string())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
    };
    let guard = gate.clone().try_lock_owned().ok();
    (gate, guard)
  }

  /// Release the in-flight gate so waiters re-read the cache.
  fn finish_flight(&self, hash: &str) {
    let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
    inflight.remove(hash);
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Check cache - if within TTL, return immediately
  /// 2. If stale/missing, fetch from network (single-flighted per key)
  /// 3. On network failure, return stale cache if one exists
  /// 4. Replace the cached result with the new data
  pub async fn fetch_list<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let hash = key.cache_hash();
    let ttl = key.ttl();

    let _guard = loop {
      if let Some(cached) = self.storage.get_query_result::<T>(&hash)? {
        if !Self::is_stale(cached.cached_at, ttl) {
          debug!(query = %key.description(), "cache hit");
          return Ok(CacheResult::from_cache(cached.entities, cached.cached_at));
        }
      }

      let (gate, guard) = self.try_lead(&hash);
      match guard {
        Some(g) => break g,
        None => {
          // Another caller is fetching this key; wait it out, then
          // re-check the cache.
          debug!(query = %key.description(), "waiting on in-flight fetch");
          drop(gate.lock().await);
        }
      }
    };

    debug!(query = %key.description(), "cache miss, fetching");
    let result = match fetcher().await {
      Ok(data) => self
        .storage
        .store_query_result(&hash, &data)
        .map(|_| CacheResult::from_network(data)),
      Err(err) => {
        // Network failed; a stale entry is better than nothing
        match self.storage.get_query_result::<T>(&hash) {
          Ok(Some(cached)) => Ok(CacheResult::offline(cached.entities, cached.cached_at)),
          _ => Err(err),
        }
      }
    };

    self.finish_flight(&hash);
    result
  }

  /// Fetch a single entity with caching.
  ///
  /// Same strategy as [`fetch_list`](Self::fetch_list); the entity is
  /// stored under the query key's hash.
  pub async fn fetch_one<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let hash = key.cache_hash();
    let ttl = key.ttl();

    let _guard = loop {
      if let Some(cached) = self.storage.get_entity::<T>(&hash)? {
        if !Self::is_stale(cached.cached_at, ttl) {
          debug!(query = %key.description(), "cache hit");
          return Ok(CacheResult::from_cache(cached.entity, cached.cached_at));
        }
      }

      let (gate, guard) = self.try_lead(&hash);
      match guard {
        Some(g) => break g,
        None => {
          debug!(query = %key.description(), "waiting on in-flight fetch");
          drop(gate.lock().await);
        }
      }
    };

    debug!(query = %key.description(), "cache miss, fetching");
    let result = match fetcher().await {
      Ok(entity) => self
        .storage
        .store_entity(&hash, &entity)
        .map(|_| CacheResult::from_network(entity)),
      Err(err) => match self.storage.get_entity::<T>(&hash) {
        Ok(Some(cached)) => Ok(CacheResult::offline(cached.entity, cached.cached_at)),
        _ => Err(err),
      },
    };

    self.finish_flight(&hash);
    result
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      inflight: Arc::clone(&self.inflight),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::super::storage::MemoryStorage;
  use super::super::traits::CacheSource;
  use super::*;
  use crate::error::Error;
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration as StdDuration;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Article {
    id: u64,
    title: String,
  }

  impl Cacheable for Article {
    fn cache_key(&self) -> String {
      self.id.to_string()
    }

    fn entity_type() -> &'static str {
      "article"
    }
  }

  struct TestKey {
    name: &'static str,
    ttl_secs: i64,
  }

  impl QueryKey for TestKey {
    fn cache_hash(&self) -> String {
      format!("test:{}", self.name)
    }

    fn description(&self) -> String {
      self.name.to_string()
    }

    fn ttl(&self) -> Duration {
      Duration::seconds(self.ttl_secs)
    }
  }

  fn articles() -> Vec<Article> {
    vec![
      Article {
        id: 1,
        title: "one".into(),
      },
      Article {
        id: 2,
        title: "two".into(),
      },
    ]
  }

  #[tokio::test]
  async fn test_second_call_within_ttl_hits_cache() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 300,
    };
    let calls = AtomicU32::new(0);

    for _ in 0..2 {
      let result = cache
        .fetch_list(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(articles())
        })
        .await
        .unwrap();
      assert_eq!(result.data, articles());
    }

    // Only the first call may touch the network
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_triggers_refetch() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 0,
    };
    let calls = AtomicU32::new(0);

    for _ in 0..2 {
      cache
        .fetch_list(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(articles())
        })
        .await
        .unwrap();
      tokio::time::sleep(StdDuration::from_millis(5)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_refetch_replaces_entry_wholesale() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 0,
    };

    cache
      .fetch_list(&key, || async { Ok(articles()) })
      .await
      .unwrap();
    tokio::time::sleep(StdDuration::from_millis(5)).await;

    let replacement = vec![Article {
      id: 9,
      title: "nine".into(),
    }];
    let second = {
      let replacement = replacement.clone();
      cache
        .fetch_list(&key, || async move { Ok(replacement) })
        .await
        .unwrap()
    };

    // Not merged with the previous two articles
    assert_eq!(second.data, replacement);
  }

  #[tokio::test]
  async fn test_concurrent_misses_are_single_flighted() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
      let cache = cache.clone();
      let calls = Arc::clone(&calls);
      handles.push(tokio::spawn(async move {
        let key = TestKey {
          name: "events",
          ttl_secs: 300,
        };
        cache
          .fetch_list(&key, || async {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(articles())
          })
          .await
          .unwrap()
      }));
    }

    for handle in handles {
      let result = handle.await.unwrap();
      assert_eq!(result.data, articles());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_network_failure_serves_stale_entry() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 0,
    };

    cache
      .fetch_list(&key, || async { Ok(articles()) })
      .await
      .unwrap();
    tokio::time::sleep(StdDuration::from_millis(5)).await;

    let result = cache
      .fetch_list::<Article, _, _, _>(&key, || async {
        Err(Error::Api {
          status: 503,
          message: "unavailable".into(),
        })
      })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data, articles());
  }

  #[tokio::test]
  async fn test_cold_miss_propagates_error() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 300,
    };

    let result = cache
      .fetch_list::<Article, _, _, _>(&key, || async {
        Err(Error::Api {
          status: 500,
          message: "boom".into(),
        })
      })
      .await;

    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
  }

  #[tokio::test]
  async fn test_fetch_one_caches_detail() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "article:1",
      ttl_secs: 300,
    };
    let calls = AtomicU32::new(0);

    for _ in 0..2 {
      let result = cache
        .fetch_one(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(Article {
            id: 1,
            title: "one".into(),
          })
        })
        .await
        .unwrap();
      assert_eq!(result.data.id, 1);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidate_type_forces_refetch() {
    let cache = CacheLayer::new(MemoryStorage::new());
    let key = TestKey {
      name: "news",
      ttl_secs: 300,
    };
    let calls = AtomicU32::new(0);

    cache
      .fetch_list(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(articles())
      })
      .await
      .unwrap();

    cache.invalidate(Some("article"));

    cache
      .fetch_list(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(articles())
      })
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
