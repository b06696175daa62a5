//! Core traits and types for the caching system.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// How long a cached entry is served without a refetch, unless the query
/// key overrides it.
pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// Trait for entities that can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity (e.g. meetup id, news article id)
  fn cache_key(&self) -> String;

  /// Entity type name for storage organization (e.g. "event", "news")
  fn entity_type() -> &'static str;
}

/// A cache lookup key for one API query.
///
/// Keys hash to a stable string (the storage key), describe themselves for
/// logging, and carry the TTL for the resource type they address.
pub trait QueryKey: Send + Sync {
  /// Stable, fixed-length storage key for this query.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;

  /// Time-to-live for results of this query.
  fn ttl(&self) -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a fresh cached entry.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode (stale entry served
  /// because the refetch failed).
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within its TTL
  CacheFresh,
  /// Network unavailable, serving a stale cached entry
  Offline,
}
