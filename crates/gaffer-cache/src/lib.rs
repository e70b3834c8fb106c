//! In-memory TTL cache and cache key policy.
//!
//! This crate provides:
//! - A process-wide key/value store with per-entry expiration and lazy expiry
//! - The analysis cache key derivation: exact write key, fuzzed lookup keys

pub mod keys;
pub mod ttl;

pub use keys::{base_second, lookup_keys, write_key, CacheKey};
pub use ttl::TtlCache;
