//! Cache storage trait and in-memory implementation.
//!
//! The cache is session-scoped: it lives for the lifetime of the client,
//! holds entries keyed by entity type and entity key, and tracks which
//! entities belong to which query so list results keep their order.
//! Entries are replaced wholesale on every store, never merged.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};

use super::traits::Cacheable;

/// Result of a cached query lookup.
#[derive(Debug, Clone)]
pub struct CachedQueryResult<T> {
  /// The cached entities in order
  pub entities: Vec<T>,
  /// When the query result was cached
  pub cached_at: DateTime<Utc>,
}

/// A single cached entity.
#[derive(Debug, Clone)]
pub struct CachedEntity<T> {
  /// The cached entity
  pub entity: T,
  /// When the entity was cached
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Store entities from a query result, replacing any previous result.
  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()>;

  /// Get cached entities for a query.
  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>>;

  /// Store a single entity under the given storage key.
  fn store_entity<T: Cacheable>(&self, entity_key: &str, entity: &T) -> Result<()>;

  /// Get a single entity by storage key.
  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>>;

  /// Drop a single cached query result.
  fn invalidate_query(&self, key: &str);

  /// Drop all entries of one entity type.
  fn invalidate_type(&self, entity_type: &str);

  /// Drop everything.
  fn invalidate_all(&self);
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store_query_result<T: Cacheable>(&self, _key: &str, _entities: &[T]) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_query_result<T: Cacheable>(&self, _key: &str) -> Result<Option<CachedQueryResult<T>>> {
    Ok(None) // Always miss
  }

  fn store_entity<T: Cacheable>(&self, _entity_key: &str, _entity: &T) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_entity<T: Cacheable>(&self, _entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    Ok(None) // Always miss
  }

  fn invalidate_query(&self, _key: &str) {}

  fn invalidate_type(&self, _entity_type: &str) {}

  fn invalidate_all(&self) {}
}

#[derive(Debug, Clone)]
struct StoredEntity {
  data: Value,
  cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredQuery {
  entity_type: &'static str,
  /// Entity keys in result order
  entity_keys: Vec<String>,
  cached_at: DateTime<Utc>,
}

/// In-memory cache storage.
///
/// Entities are stored serialized (as `serde_json::Value`) under
/// `(entity_type, entity_key)`; query results map a query hash to an
/// ordered list of entity keys. No size bound: entries only leave via
/// invalidation, staleness is the layer's concern.
pub struct MemoryStorage {
  entities: Mutex<HashMap<(&'static str, String), StoredEntity>>,
  queries: Mutex<HashMap<String, StoredQuery>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self {
      entities: Mutex::new(HashMap::new()),
      queries: Mutex::new(HashMap::new()),
    }
  }
}

impl Default for MemoryStorage {
  fn default() -> Self {
    Self::new()
  }
}

fn serialize<T: Cacheable>(entity: &T) -> Result<Value> {
  serde_json::to_value(entity).map_err(|e| Error::Cache(format!("failed to serialize entity: {e}")))
}

impl CacheStorage for MemoryStorage {
  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()> {
    let now = Utc::now();
    let entity_type = T::entity_type();

    let mut entity_keys = Vec::with_capacity(entities.len());
    let mut serialized = Vec::with_capacity(entities.len());
    for entity in entities {
      entity_keys.push(entity.cache_key());
      serialized.push(serialize(entity)?);
    }

    {
      let mut store = self.entities.lock().unwrap_or_else(|e| e.into_inner());
      for (entity_key, data) in entity_keys.iter().zip(serialized) {
        store.insert(
          (entity_type, entity_key.clone()),
          StoredEntity {
            data,
            cached_at: now,
          },
        );
      }
    }

    let mut queries = self.queries.lock().unwrap_or_else(|e| e.into_inner());
    queries.insert(
      key.to_string(),
      StoredQuery {
        entity_type,
        entity_keys,
        cached_at: now,
      },
    );

    Ok(())
  }

  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    let entity_type = T::entity_type();

    let query = {
      let queries = self.queries.lock().unwrap_or_else(|e| e.into_inner());
      match queries.get(key) {
        Some(q) if q.entity_type == entity_type => q.clone(),
        _ => return Ok(None),
      }
    };

    let store = self.entities.lock().unwrap_or_else(|e| e.into_inner());
    let entities: Vec<T> = query
      .entity_keys
      .iter()
      .filter_map(|k| store.get(&(entity_type, k.clone())))
      .filter_map(|stored| serde_json::from_value(stored.data.clone()).ok())
      .collect();

    Ok(Some(CachedQueryResult {
      entities,
      cached_at: query.cached_at,
    }))
  }

  fn store_entity<T: Cacheable>(&self, entity_key: &str, entity: &T) -> Result<()> {
    let data = serialize(entity)?;
    let mut store = self.entities.lock().unwrap_or_else(|e| e.into_inner());
    store.insert(
      (T::entity_type(), entity_key.to_string()),
      StoredEntity {
        data,
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    let store = self.entities.lock().unwrap_or_else(|e| e.into_inner());
    let stored = match store.get(&(T::entity_type(), entity_key.to_string())) {
      Some(s) => s.clone(),
      None => return Ok(None),
    };
    drop(store);

    let entity: T = serde_json::from_value(stored.data)
      .map_err(|e| Error::Cache(format!("failed to deserialize entity: {e}")))?;

    Ok(Some(CachedEntity {
      entity,
      cached_at: stored.cached_at,
    }))
  }

  fn invalidate_query(&self, key: &str) {
    let mut queries = self.queries.lock().unwrap_or_else(|e| e.into_inner());
    queries.remove(key);
  }

  fn invalidate_type(&self, entity_type: &str) {
    {
      let mut store = self.entities.lock().unwrap_or_else(|e| e.into_inner());
      store.retain(|(t, _), _| *t != entity_type);
    }
    let mut queries = self.queries.lock().unwrap_or_else(|e| e.into_inner());
    queries.retain(|_, q| q.entity_type != entity_type);
  }

  fn invalidate_all(&self) {
    self
      .entities
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clear();
    self
      .queries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: u64,
    name: String,
  }

  impl Cacheable for Item {
    fn cache_key(&self) -> String {
      self.id.to_string()
    }

    fn entity_type() -> &'static str {
      "item"
    }
  }

  fn item(id: u64, name: &str) -> Item {
    Item {
      id,
      name: name.to_string(),
    }
  }

  #[test]
  fn test_query_roundtrip_preserves_order() {
    let storage = MemoryStorage::new();
    let items = vec![item(3, "c"), item(1, "a"), item(2, "b")];
    storage.store_query_result("q1", &items).unwrap();

    let cached = storage.get_query_result::<Item>("q1").unwrap().unwrap();
    assert_eq!(cached.entities, items);
  }

  #[test]
  fn test_missing_query_is_none() {
    let storage = MemoryStorage::new();
    assert!(storage.get_query_result::<Item>("nope").unwrap().is_none());
  }

  #[test]
  fn test_store_replaces_previous_result() {
    let storage = MemoryStorage::new();
    storage
      .store_query_result("q1", &[item(1, "a"), item(2, "b")])
      .unwrap();
    storage.store_query_result("q1", &[item(9, "z")]).unwrap();

    let cached = storage.get_query_result::<Item>("q1").unwrap().unwrap();
    // Replaced wholesale, not merged
    assert_eq!(cached.entities, vec![item(9, "z")]);
  }

  #[test]
  fn test_entity_roundtrip() {
    let storage = MemoryStorage::new();
    storage.store_entity("7", &item(7, "seven")).unwrap();

    let cached = storage.get_entity::<Item>("7").unwrap().unwrap();
    assert_eq!(cached.entity, item(7, "seven"));
  }

  #[test]
  fn test_invalidate_type_clears_entities_and_queries() {
    let storage = MemoryStorage::new();
    storage.store_query_result("q1", &[item(1, "a")]).unwrap();
    storage.store_entity("2", &item(2, "b")).unwrap();

    storage.invalidate_type("item");

    assert!(storage.get_query_result::<Item>("q1").unwrap().is_none());
    assert!(storage.get_entity::<Item>("2").unwrap().is_none());
  }

  #[test]
  fn test_invalidate_query_leaves_entities() {
    let storage = MemoryStorage::new();
    storage.store_query_result("q1", &[item(1, "a")]).unwrap();

    storage.invalidate_query("q1");

    assert!(storage.get_query_result::<Item>("q1").unwrap().is_none());
    // The entity itself is still reachable by key
    assert!(storage.get_entity::<Item>("1").unwrap().is_some());
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.store_query_result("q1", &[item(1, "a")]).unwrap();
    storage.store_entity("1", &item(1, "a")).unwrap();
    assert!(storage.get_query_result::<Item>("q1").unwrap().is_none());
    assert!(storage.get_entity::<Item>("1").unwrap().is_none());
  }
}
