use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::EntryOrigin;
use crate::github::types::Issue;
use crate::github::{GithubCache, GithubQueryKey, IssueSource};

use super::detail::{comments_loader, comments_options, issue_loader, issue_options};

/// How long a list row stands in for the full issue
pub const PRIME_WINDOW: Duration = Duration::from_secs(60);

/// Warm the cache for the detail view of a highlighted list row.
///
/// Seeds the detail key with the row's partial issue so the detail view
/// renders without a spinner, then prefetches the full issue and its comments
/// in the background. Nothing is cancelled when the highlight moves on.
pub fn prime_issue<S: IssueSource>(cache: &GithubCache, source: &S, issue: &Issue) {
  let number = issue.number;
  let key = GithubQueryKey::Issue { number };

  let has_full_issue = cache
    .get::<Issue>(&key)
    .is_some_and(|entry| entry.is_fresh() && entry.origin == EntryOrigin::Fetched);
  if !has_full_issue {
    cache.set(key.clone(), issue.clone(), Instant::now() + PRIME_WINDOW);
  }

  debug!(number, "priming issue");
  cache.prefetch(key, issue_loader(source, number), issue_options());
  cache.prefetch(
    GithubQueryKey::IssueComments { number },
    comments_loader(source, number),
    comments_options(),
  );
}
