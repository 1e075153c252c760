//! Cache layer that orchestrates caching logic with network fetching.

use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::storage::{AnyValue, MemoryStorage, SharedLoad};
use super::traits::{CacheEntry, CacheKey, Cacheable, EntryOrigin, FetchOptions, FetchStatus};

/// Query cache shared by every view.
///
/// Cloning is cheap; all clones see the same entries.
pub struct QueryCache<K: CacheKey> {
  storage: Arc<MemoryStorage<K>>,
}

impl<K: CacheKey> QueryCache<K> {
  pub fn new() -> Self {
    Self {
      storage: Arc::new(MemoryStorage::new()),
    }
  }

  /// Current value for `key`, fresh or stale.
  ///
  /// Returns `None` on a miss or when the stored value is not a `T`.
  pub fn get<T: Cacheable>(&self, key: &K) -> Option<CacheEntry<T>> {
    self.storage.read(key, |slot| {
      let slot = slot?;
      let data = slot.value.as_deref()?.downcast_ref::<T>()?.clone();
      Some(CacheEntry {
        data,
        fresh_until: slot.fresh_until?,
        origin: slot.origin,
      })
    })
  }

  /// Seed `key` with `value` without fetching.
  ///
  /// The value is considered fresh until `fresh_until`. A load already in
  /// flight for the key still lands afterwards and replaces the seed.
  pub fn set<T: Cacheable>(&self, key: K, value: T, fresh_until: Instant) {
    debug!(key = %key.description(), "seeding cache");
    self.storage.with_slot(&key, |slot| {
      slot.value = Some(Arc::new(value));
      slot.fresh_until = Some(fresh_until);
      slot.origin = EntryOrigin::Seeded;
      slot.touch();
    });
  }

  /// Mark `key` stale so the next read triggers a load
  pub fn invalidate(&self, key: &K) {
    let now = Instant::now();
    self.storage.with_slot(key, |slot| {
      if slot.fresh_until.is_some() {
        slot.fresh_until = Some(now);
      }
      slot.touch();
    });
  }

  pub fn status(&self, key: &K) -> FetchStatus {
    self
      .storage
      .read(key, |slot| slot.map(|s| s.status()).unwrap_or(FetchStatus::Idle))
  }

  /// Change counter for `key`, 0 for a key never touched
  pub fn version(&self, key: &K) -> u64 {
    self.storage.read(key, |slot| slot.map(|s| s.version).unwrap_or(0))
  }

  /// Freshness deadline of the stored value, if there is one
  pub fn fresh_until(&self, key: &K) -> Option<Instant> {
    self
      .storage
      .read(key, |slot| slot.filter(|s| s.value.is_some()).and_then(|s| s.fresh_until))
  }

  pub fn is_fresh(&self, key: &K) -> bool {
    let now = Instant::now();
    self
      .storage
      .read(key, |slot| slot.is_some_and(|s| s.is_fresh(now)))
  }

  /// Load `key`, sharing the load with any concurrent caller of the same key.
  ///
  /// Only one load per key is ever in flight; every caller observes the same
  /// eventual result. The loader is attempted `1 + options.retry` times.
  #[allow(dead_code)]
  pub async fn fetch_deduped<T, F, Fut>(
    &self,
    key: K,
    loader: F,
    options: FetchOptions,
  ) -> Result<T, String>
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let description = key.description();
    let value = self.start_load(key, loader, options).await?;
    value
      .downcast::<T>()
      .map(|data| T::clone(&data))
      .map_err(|_| format!("Cached value for {} has an unexpected type", description))
  }

  /// Return fresh data without a network call, loading otherwise.
  ///
  /// Seeded values count as fresh until their deadline.
  #[allow(dead_code)]
  pub async fn get_or_fetch<T, F, Fut>(
    &self,
    key: K,
    loader: F,
    options: FetchOptions,
  ) -> Result<T, String>
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if let Some(entry) = self.get::<T>(&key) {
      if entry.is_fresh() {
        debug!(key = %key.description(), origin = ?entry.origin, "cache hit");
        return Ok(entry.data);
      }
    }
    debug!(key = %key.description(), "cache miss");
    self.fetch_deduped(key, loader, options).await
  }

  /// Load `key` in the background unless it holds fresh fetched data.
  ///
  /// Seeded values are always upgraded by a prefetch. Fire-and-forget: the
  /// result is only observable through the cache.
  pub fn prefetch<T, F, Fut>(&self, key: K, loader: F, options: FetchOptions)
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let now = Instant::now();
    let fresh_fetched = self.storage.read(&key, |slot| {
      slot.is_some_and(|s| s.is_fresh(now) && s.origin == EntryOrigin::Fetched)
    });
    if fresh_fetched {
      debug!(key = %key.description(), "prefetch skipped, data is fresh");
      return;
    }
    debug!(key = %key.description(), "prefetching");
    drop(self.start_load(key, loader, options));
  }

  /// Load `key` in the background unless it holds fresh data of any origin
  pub fn ensure<T, F, Fut>(&self, key: K, loader: F, options: FetchOptions)
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_fresh(&key) {
      return;
    }
    drop(self.start_load(key, loader, options));
  }

  /// Load `key` in the background regardless of freshness.
  ///
  /// Joins the in-flight load when there is one.
  pub fn fetch_in_background<T, F, Fut>(&self, key: K, loader: F, options: FetchOptions)
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    drop(self.start_load(key, loader, options));
  }

  /// Join the in-flight load for `key`, or start one.
  ///
  /// A new load is driven by its own task, so it completes and lands in the
  /// cache even when every caller stops waiting for it.
  fn start_load<T, F, Fut>(&self, key: K, loader: F, options: FetchOptions) -> SharedLoad
  where
    T: Cacheable,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let (load, started) = self.storage.with_slot(&key, |slot| {
      if let Some(load) = &slot.in_flight {
        debug!(key = %key.description(), "joining in-flight load");
        return (load.clone(), false);
      }

      let cache = self.clone();
      let load_key = key.clone();
      let load = async move {
        let result = load_with_retry(&load_key, &loader, options.retry)
          .await
          .map(|data| Arc::new(data) as AnyValue);
        cache.complete_load(&load_key, &result, options);
        result
      }
      .boxed()
      .shared();

      slot.in_flight = Some(load.clone());
      slot.touch();
      (load, true)
    });

    if started {
      tokio::spawn(load.clone());
    }
    load
  }

  fn complete_load(&self, key: &K, result: &Result<AnyValue, String>, options: FetchOptions) {
    let now = Instant::now();
    self.storage.with_slot(key, |slot| {
      slot.in_flight = None;
      match result {
        Ok(value) => {
          slot.value = Some(Arc::clone(value));
          slot.fresh_until = Some(now + options.stale_time);
          slot.origin = EntryOrigin::Fetched;
          slot.error = None;
        }
        Err(e) => {
          // Keep the previous value; only the status reports the failure
          slot.error = Some(e.clone());
        }
      }
      slot.touch();
    });
  }
}

impl<K: CacheKey> Default for QueryCache<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: CacheKey> Clone for QueryCache<K> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

/// Run `loader` until it succeeds or `retry` extra attempts are used up
async fn load_with_retry<K, T, F, Fut>(key: &K, loader: &F, retry: u32) -> Result<T, String>
where
  K: CacheKey,
  F: Fn() -> Fut,
  Fut: Future<Output = Result<T, String>>,
{
  let mut attempt = 0;
  loop {
    match loader().await {
      Ok(data) => return Ok(data),
      Err(e) if attempt < retry => {
        attempt += 1;
        warn!(key = %key.description(), attempt, error = %e, "load failed, retrying");
      }
      Err(e) => {
        error!(key = %key.description(), error = %e, "load failed");
        return Err(e);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, Eq, Hash)]
  enum Key {
    Item(u32),
    Other,
  }

  impl CacheKey for Key {
    fn description(&self) -> String {
      format!("{:?}", self)
    }
  }

  fn counting_loader(
    calls: Arc<AtomicU32>,
    value: &'static str,
    delay: Duration,
  ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<String, String>> + Send + Sync {
    move || {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        Ok(value.to_string())
      }
      .boxed()
    }
  }

  fn failing_loader(
    calls: Arc<AtomicU32>,
  ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<String, String>> + Send + Sync {
    move || {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("connection reset".to_string())
      }
      .boxed()
    }
  }

  const MINUTE: Duration = Duration::from_secs(60);

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_fetches_are_deduplicated() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let (a, b) = tokio::join!(
      cache.fetch_deduped(
        Key::Item(1),
        counting_loader(calls.clone(), "full", Duration::from_millis(100)),
        FetchOptions::stale_after(MINUTE),
      ),
      cache.fetch_deduped(
        Key::Item(1),
        counting_loader(calls.clone(), "other", Duration::from_millis(100)),
        FetchOptions::stale_after(MINUTE),
      ),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap(), "full");
    assert_eq!(b.unwrap(), "full");
  }

  #[tokio::test(start_paused = true)]
  async fn test_distinct_keys_do_not_share_loads() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let options = FetchOptions::stale_after(MINUTE);

    let (a, b) = tokio::join!(
      cache.fetch_deduped(Key::Item(1), counting_loader(calls.clone(), "one", Duration::from_millis(10)), options),
      cache.fetch_deduped(Key::Item(2), counting_loader(calls.clone(), "two", Duration::from_millis(10)), options),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.unwrap(), "one");
    assert_eq!(b.unwrap(), "two");
    assert_eq!(cache.get::<String>(&Key::Item(2)).unwrap().data, "two");
  }

  #[tokio::test(start_paused = true)]
  async fn test_seeded_value_is_served_without_network() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    cache.set(Key::Item(1), "partial".to_string(), Instant::now() + MINUTE);

    let entry = cache.get::<String>(&Key::Item(1)).unwrap();
    assert_eq!(entry.data, "partial");
    assert_eq!(entry.origin, EntryOrigin::Seeded);
    assert!(entry.is_fresh());

    let value = cache
      .get_or_fetch(
        Key::Item(1),
        counting_loader(calls.clone(), "full", Duration::ZERO),
        FetchOptions::stale_after(MINUTE),
      )
      .await
      .unwrap();
    assert_eq!(value, "partial");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_seeded_value_expires_after_deadline() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    cache.set(Key::Item(1), "partial".to_string(), Instant::now() + MINUTE);
    tokio::time::advance(MINUTE + Duration::from_secs(1)).await;

    assert!(cache.get::<String>(&Key::Item(1)).unwrap().is_stale());
    let value = cache
      .get_or_fetch(
        Key::Item(1),
        counting_loader(calls.clone(), "full", Duration::ZERO),
        FetchOptions::stale_after(MINUTE),
      )
      .await
      .unwrap();
    assert_eq!(value, "full");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_prefetch_upgrades_seeded_value() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    cache.set(Key::Item(1), "partial".to_string(), Instant::now() + MINUTE);
    cache.prefetch(
      Key::Item(1),
      counting_loader(calls.clone(), "full", Duration::from_millis(500)),
      FetchOptions::stale_after(MINUTE),
    );

    assert_eq!(cache.get::<String>(&Key::Item(1)).unwrap().data, "partial");
    assert_eq!(cache.status(&Key::Item(1)), FetchStatus::Fetching);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let entry = cache.get::<String>(&Key::Item(1)).unwrap();
    assert_eq!(entry.data, "full");
    assert_eq!(entry.origin, EntryOrigin::Fetched);
    assert_eq!(cache.status(&Key::Item(1)), FetchStatus::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_prefetch_skips_fresh_fetched_data() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let options = FetchOptions::stale_after(MINUTE);

    cache
      .fetch_deduped(Key::Item(1), counting_loader(calls.clone(), "full", Duration::ZERO), options)
      .await
      .unwrap();
    cache.prefetch(Key::Item(1), counting_loader(calls.clone(), "again", Duration::ZERO), options);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get::<String>(&Key::Item(1)).unwrap().data, "full");
  }

  #[tokio::test(start_paused = true)]
  async fn test_retry_attempts_loader_again() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let result = cache
      .fetch_deduped::<String, _, _>(
        Key::Item(1),
        failing_loader(calls.clone()),
        FetchOptions::stale_after(MINUTE).with_retry(2),
      )
      .await;

    assert_eq!(result.unwrap_err(), "connection reset");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
      cache.status(&Key::Item(1)),
      FetchStatus::Error("connection reset".to_string())
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_no_retry_fails_after_one_attempt() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let result = cache
      .fetch_deduped::<String, _, _>(
        Key::Other,
        failing_loader(calls.clone()),
        FetchOptions::stale_after(MINUTE),
      )
      .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_refresh_keeps_previous_value() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    cache.set(Key::Item(1), "old".to_string(), Instant::now() + MINUTE);
    cache.invalidate(&Key::Item(1));
    let result = cache
      .fetch_deduped::<String, _, _>(Key::Item(1), failing_loader(calls), FetchOptions::default())
      .await;

    assert!(result.is_err());
    assert_eq!(cache.get::<String>(&Key::Item(1)).unwrap().data, "old");
    assert!(matches!(cache.status(&Key::Item(1)), FetchStatus::Error(_)));
  }

  #[tokio::test(start_paused = true)]
  async fn test_load_completes_when_caller_is_dropped() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let pending = cache.fetch_deduped(
      Key::Item(1),
      counting_loader(calls.clone(), "full", Duration::from_millis(100)),
      FetchOptions::stale_after(MINUTE),
    );
    // Poll once so the load starts, then give up on it
    let _ = tokio::time::timeout(Duration::from_millis(10), pending).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get::<String>(&Key::Item(1)).unwrap().data, "full");
  }

  #[tokio::test(start_paused = true)]
  async fn test_version_changes_on_every_mutation() {
    let cache: QueryCache<Key> = QueryCache::new();
    assert_eq!(cache.version(&Key::Other), 0);

    cache.set(Key::Other, 1u32, Instant::now() + MINUTE);
    let after_set = cache.version(&Key::Other);
    assert!(after_set > 0);

    cache.invalidate(&Key::Other);
    assert!(cache.version(&Key::Other) > after_set);
    assert!(!cache.is_fresh(&Key::Other));
  }

  #[tokio::test]
  async fn test_wrong_type_reads_as_miss() {
    let cache = QueryCache::new();
    cache.set(Key::Other, 42u32, Instant::now() + MINUTE);

    assert!(cache.get::<String>(&Key::Other).is_none());
    assert_eq!(cache.get::<u32>(&Key::Other).unwrap().data, 42);
  }
}
