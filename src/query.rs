//! Query observers for views.
//!
//! Inspired by TanStack Query, a `Query<T>` binds one cache key to the
//! fetcher that fills it. Views call `fetch()` once, `poll()` on every tick
//! and render from `state()`. The data itself lives in the shared
//! [`QueryCache`](crate::cache::QueryCache), so anything that writes the key
//! (a prefetch, a seed, another view) shows up here on the next poll.
//!
//! # Example
//!
//! ```ignore
//! let mut query = Query::new(cache, GithubQueryKey::Labels, options, move || {
//!     let source = source.clone();
//!     async move { source.get_labels().await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::Instant;

use crate::cache::{Cacheable, FetchOptions, FetchStatus};
use crate::github::{GithubCache, GithubQueryKey};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is fetching and has no data to show yet
  Loading,
  /// Data is available (possibly stale or partial while a refresh runs)
  Success(T),
  /// Query failed with an error and has no data to show
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Observer of one cache key.
pub struct Query<T> {
  cache: GithubCache,
  key: GithubQueryKey,
  fetcher: FetcherFn<T>,
  options: FetchOptions,
  state: QueryState<T>,
  fetching: bool,
  last_error: Option<String>,
  seen_version: Option<u64>,
  /// Deadline of the stale value a reload was already started for
  stale_reload: Option<Instant>,
}

impl<T: Cacheable> Query<T> {
  /// Create a new query for `key`.
  ///
  /// The fetcher is only called when the cache holds no fresh value for the
  /// key and no load for it is already running.
  pub fn new<F, Fut>(cache: GithubCache, key: GithubQueryKey, options: FetchOptions, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      cache,
      key,
      fetcher: Arc::new(move || -> BoxFuture<T> { Box::pin(fetcher()) }),
      options,
      state: QueryState::Idle,
      fetching: false,
      last_error: None,
      seen_version: None,
      stale_reload: None,
    }
  }

  pub fn key(&self) -> &GithubQueryKey {
    &self.key
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// No data yet and a load is running
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// A load is running, with or without data to show
  pub fn is_fetching(&self) -> bool {
    self.fetching
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Error of the last failed load, even when older data is still shown
  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Check if the cached data is past its freshness deadline.
  pub fn is_stale(&self) -> bool {
    self
      .cache
      .get::<T>(&self.key)
      .map(|entry| entry.is_stale())
      .unwrap_or(true)
  }

  /// Load the key unless the cache already holds fresh data for it.
  ///
  /// This is a no-op if a load for the key is already running.
  pub fn fetch(&mut self) {
    let fetcher = self.fetcher.clone();
    self
      .cache
      .ensure(self.key.clone(), move || fetcher(), self.options);
    self.sync();
  }

  /// Force a reload, even if the cached data is fresh.
  pub fn refetch(&mut self) {
    self.cache.invalidate(&self.key);
    self.stale_reload = self.cache.fresh_until(&self.key);
    self.fetch();
  }

  /// Reload once the value on screen has passed its freshness deadline.
  ///
  /// Expiry does not change the cache version, so `poll()` alone never
  /// notices it. Each stale value gets one reload; when that fails the value
  /// stays up with `last_error()` set until `refetch()` or new data.
  pub fn refresh_if_stale(&mut self) {
    if self.fetching || !self.is_stale() {
      return;
    }
    let Some(deadline) = self.cache.fresh_until(&self.key) else {
      return;
    };
    if self.stale_reload == Some(deadline) {
      return;
    }
    self.stale_reload = Some(deadline);
    self.fetch();
  }

  /// Pick up changes to the cache entry.
  ///
  /// Returns `true` if the entry changed since the last poll.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    if self.seen_version == Some(self.cache.version(&self.key)) {
      return false;
    }
    self.sync();
    true
  }

  fn sync(&mut self) {
    self.seen_version = Some(self.cache.version(&self.key));
    let status = self.cache.status(&self.key);

    self.fetching = status == FetchStatus::Fetching;
    self.last_error = match &status {
      FetchStatus::Error(e) => Some(e.clone()),
      _ => None,
    };
    self.state = match (self.cache.get::<T>(&self.key), status) {
      (Some(entry), _) => QueryState::Success(entry.data),
      (None, FetchStatus::Error(e)) => QueryState::Error(e),
      (None, FetchStatus::Fetching) => QueryState::Loading,
      (None, FetchStatus::Idle) => QueryState::Idle,
    };
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .field("fetching", &self.fetching)
      .finish_non_exhaustive()
  }
}
