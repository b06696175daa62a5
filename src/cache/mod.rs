//! Session-scoped caching layer for API reads.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Caches query results and individual entities with a per-resource TTL
//! - Replaces entries wholesale on refetch (no merging)
//! - De-duplicates concurrent fetches for the same key (single flight)
//! - Serves a stale entry when the network is unavailable

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey, DEFAULT_TTL_SECS};
