//! Slot storage backing the query cache.

use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

use super::traits::{CacheKey, EntryOrigin, FetchStatus};

/// Type-erased cached value
pub(super) type AnyValue = Arc<dyn Any + Send + Sync>;

/// A load in progress, shareable between every caller of the same key
pub(super) type SharedLoad = Shared<BoxFuture<'static, Result<AnyValue, String>>>;

/// Everything the cache knows about one key.
#[derive(Default)]
pub(super) struct Slot {
  pub value: Option<AnyValue>,
  pub fresh_until: Option<Instant>,
  pub origin: EntryOrigin,
  /// Error of the last failed load, cleared by the next success
  pub error: Option<String>,
  pub in_flight: Option<SharedLoad>,
  /// Bumped on every mutation so observers can detect changes
  pub version: u64,
}

impl Slot {
  pub fn is_fresh(&self, now: Instant) -> bool {
    self.value.is_some() && self.fresh_until.is_some_and(|until| now < until)
  }

  pub fn status(&self) -> FetchStatus {
    if self.in_flight.is_some() {
      FetchStatus::Fetching
    } else if let Some(error) = &self.error {
      FetchStatus::Error(error.clone())
    } else {
      FetchStatus::Idle
    }
  }

  pub fn touch(&mut self) {
    self.version += 1;
  }
}

/// In-memory map of slots.
///
/// The lock is only ever held for short synchronous sections, never across an
/// `.await`.
pub(super) struct MemoryStorage<K: CacheKey> {
  slots: Mutex<HashMap<K, Slot>>,
}

impl<K: CacheKey> MemoryStorage<K> {
  pub fn new() -> Self {
    Self {
      slots: Mutex::new(HashMap::new()),
    }
  }

  /// Run `f` against the slot for `key`, creating it if missing
  pub fn with_slot<R>(&self, key: &K, f: impl FnOnce(&mut Slot) -> R) -> R {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let slot = slots.entry(key.clone()).or_default();
    f(slot)
  }

  /// Run `f` against the slot for `key` without creating it
  pub fn read<R>(&self, key: &K, f: impl FnOnce(Option<&Slot>) -> R) -> R {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    f(slots.get(key))
  }
}
