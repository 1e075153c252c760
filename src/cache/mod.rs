//! In-memory query cache with staleness tracking and request deduplication.
//!
//! This module provides a GitHub-agnostic caching mechanism that:
//! - Stores one value per key, with a freshness deadline on a monotonic clock
//! - Runs at most one load per key; concurrent callers share its result
//! - Supports manual seeding and fire-and-forget prefetching
//! - Keeps the last good value when a refresh fails

mod layer;
mod storage;
mod traits;

pub use layer::QueryCache;
pub use traits::{CacheKey, Cacheable, EntryOrigin, FetchOptions, FetchStatus};
