//! Core traits and types for the caching system.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Trait for values that can live in the cache.
///
/// Values are stored type-erased and cloned out on read.
pub trait Cacheable: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Cacheable for T {}

/// Trait for cache keys.
///
/// A key is an ordered tuple of resource kind plus every parameter that
/// identifies the resource; two requests share an entry only when their keys
/// are equal.
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
  /// Human-readable description for logging
  fn description(&self) -> String;
}

/// How an entry's current value got into the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrigin {
  /// Written by hand without a fetch (possibly partial data)
  #[default]
  Seeded,
  /// Result of a completed load
  Fetched,
}

/// A cached value together with its freshness metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub data: T,
  /// The value is fresh strictly before this instant
  pub fresh_until: Instant,
  pub origin: EntryOrigin,
}

impl<T> CacheEntry<T> {
  pub fn is_fresh(&self) -> bool {
    Instant::now() < self.fresh_until
  }

  pub fn is_stale(&self) -> bool {
    !self.is_fresh()
  }
}

/// Load status of a key, independent of whether data is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
  Idle,
  Fetching,
  /// Last load failed after exhausting its retries
  Error(String),
}

/// Options for a single load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
  /// How long a successful result stays fresh
  pub stale_time: Duration,
  /// Additional attempts after the first failure
  pub retry: u32,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::ZERO,
      retry: 0,
    }
  }
}

impl FetchOptions {
  pub fn stale_after(stale_time: Duration) -> Self {
    Self {
      stale_time,
      ..Self::default()
    }
  }

  pub fn with_retry(mut self, retry: u32) -> Self {
    self.retry = retry;
    self
  }
}
