use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;

use crate::cache::FetchOptions;
use crate::github::types::{Comment, Issue};
use crate::github::{GithubCache, GithubQueryKey, IssueSource};
use crate::query::Query;

/// Freshness window of issue details and comments
pub const DETAIL_STALE_TIME: Duration = Duration::from_secs(60);

/// Extra attempts for comments; details rely on the seeded list data instead
pub const COMMENTS_RETRY: u32 = 2;

type Loader<T> = BoxFuture<'static, Result<T, String>>;

pub fn issue_options() -> FetchOptions {
  FetchOptions::stale_after(DETAIL_STALE_TIME)
}

pub fn comments_options() -> FetchOptions {
  FetchOptions::stale_after(DETAIL_STALE_TIME).with_retry(COMMENTS_RETRY)
}

pub fn issue_loader<S: IssueSource>(
  source: &S,
  number: u64,
) -> impl Fn() -> Loader<Issue> + Send + Sync + 'static {
  let source = source.clone();
  move || {
    let source = source.clone();
    async move { source.get_issue(number).await.map_err(|e| e.to_string()) }.boxed()
  }
}

pub fn comments_loader<S: IssueSource>(
  source: &S,
  number: u64,
) -> impl Fn() -> Loader<Vec<Comment>> + Send + Sync + 'static {
  let source = source.clone();
  move || {
    let source = source.clone();
    async move {
      source
        .get_issue_comments(number)
        .await
        .map_err(|e| e.to_string())
    }
    .boxed()
  }
}

/// Query for the full issue, showing seeded list data until it lands
pub fn issue_query<S: IssueSource>(cache: &GithubCache, source: &S, number: u64) -> Query<Issue> {
  Query::new(
    cache.clone(),
    GithubQueryKey::Issue { number },
    issue_options(),
    issue_loader(source, number),
  )
}

pub fn comments_query<S: IssueSource>(
  cache: &GithubCache,
  source: &S,
  number: u64,
) -> Query<Vec<Comment>> {
  Query::new(
    cache.clone(),
    GithubQueryKey::IssueComments { number },
    comments_options(),
    comments_loader(source, number),
  )
}
