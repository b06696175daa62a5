//! Typed clients for the platform's REST resources.

pub mod cached;
pub mod client;
pub mod keys;
pub mod types;

pub use cached::CachedPlatformClient;
pub use client::PlatformClient;
pub use keys::ResourceKey;
