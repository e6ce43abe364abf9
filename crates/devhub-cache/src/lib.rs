//! # Devhub Cache
//!
//! Cache-aside caching for the devhub API.
//!
//! This crate provides:
//! - A [`KeyValueStore`] capability with Redis and in-memory backends
//! - [`CacheAccessor`], a fail-open get/set/delete/clear layer over JSON payloads
//! - Key naming per resource and glob-based invalidation after writes
//! - Cache configuration from environment variables
//!
//! # Example
//!
//! ```ignore
//! use devhub_cache::{CacheAccessor, CacheConfig, StoreMutation, invalidate, keys};
//!
//! let cache = CacheAccessor::from_config(&CacheConfig::from_env());
//!
//! let key = keys::store::list(&keys::store::ListQuery::default());
//! let listing = cache
//!     .get_or_compute(&key, cache.default_ttl(), || load_listing())
//!     .await?;
//!
//! // After a write
//! invalidate::apply(&cache, &StoreMutation::Created).await;
//! ```

pub mod accessor;
pub mod config;
pub mod invalidate;
pub mod keys;
pub mod memory;
pub mod pattern;
pub mod redis;
pub mod store;

pub use accessor::{CacheAccessor, CacheError, Lookup};
pub use config::CacheConfig;
pub use invalidate::{InvalidationPlan, Mutation, NewsMutation, StoreMutation};
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::{DisabledStore, KeyValueStore, StoreError};
