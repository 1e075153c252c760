use std::time::Duration;

use crate::cache::FetchOptions;
use crate::github::types::Label;
use crate::github::{GithubCache, GithubQueryKey, IssueSource};
use crate::query::Query;

/// Labels rarely change; keep them for an hour
pub const LABELS_STALE_TIME: Duration = Duration::from_secs(60 * 60);

pub fn labels_query<S: IssueSource>(cache: &GithubCache, source: &S) -> Query<Vec<Label>> {
  let source = source.clone();
  Query::new(
    cache.clone(),
    GithubQueryKey::Labels,
    FetchOptions::stale_after(LABELS_STALE_TIME),
    move || {
      let source = source.clone();
      async move { source.get_labels().await.map_err(|e| e.to_string()) }
    },
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queries::fake::FakeSource;

  #[tokio::test(start_paused = true)]
  async fn test_labels_are_shared_between_queries() {
    let cache = GithubCache::new();
    let source = FakeSource::new(5, 1);

    let mut first = labels_query(&cache, &source);
    first.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    first.poll();

    let mut second = labels_query(&cache, &source);
    second.fetch();

    assert_eq!(second.data().map(Vec::len), Some(2));
    assert_eq!(source.label_calls(), 1);
  }
}
