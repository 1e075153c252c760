use std::time::Duration;

use crate::cache::FetchOptions;
use crate::github::types::{Issue, StateFilter};
use crate::github::{GithubCache, GithubQueryKey, IssueSource};
use crate::query::Query;

use super::IssueFilter;

/// Freshness window of the accumulated list
pub const INFINITE_STALE_TIME: Duration = Duration::from_secs(60);

/// Page parameter of the first fetch
pub const FIRST_PAGE: u32 = 1;

/// Append-only sequence of fetched pages
#[derive(Debug, Clone, PartialEq)]
pub struct InfinitePages<T> {
  pub pages: Vec<Vec<T>>,
  /// Page parameter each page was fetched with
  pub page_params: Vec<u32>,
}

impl<T> Default for InfinitePages<T> {
  fn default() -> Self {
    Self {
      pages: Vec::new(),
      page_params: Vec::new(),
    }
  }
}

impl<T> InfinitePages<T> {
  /// Continuation token: `None` once the last fetched page came back empty,
  /// otherwise the number of pages fetched so far plus one.
  pub fn next_page_param(&self) -> Option<u32> {
    match self.pages.last() {
      Some(last) if last.is_empty() => None,
      _ => Some(self.pages.len() as u32 + 1),
    }
  }

  pub fn push(&mut self, param: u32, page: Vec<T>) {
    self.page_params.push(param);
    self.pages.push(page);
  }

  /// All pages concatenated in fetch order
  pub fn items(&self) -> impl Iterator<Item = &T> {
    self.pages.iter().flatten()
  }
}

/// Issue list that grows page by page.
///
/// All pages for one filter live in a single cache entry, so switching
/// filters never mixes pages of different filters.
pub struct InfiniteIssues<S: IssueSource> {
  source: S,
  cache: GithubCache,
  filter: IssueFilter,
  query: Query<InfinitePages<Issue>>,
  items: Vec<Issue>,
  fetching_next: bool,
}

impl<S: IssueSource> InfiniteIssues<S> {
  pub fn new(source: S, cache: GithubCache, filter: IssueFilter) -> Self {
    let mut list = Self {
      query: pages_query(&source, &cache, &filter),
      source,
      cache,
      filter,
      items: Vec::new(),
      fetching_next: false,
    };
    list.query.fetch();
    list.sync_items();
    list
  }

  pub fn filter(&self) -> &IssueFilter {
    &self.filter
  }

  pub fn query(&self) -> &Query<InfinitePages<Issue>> {
    &self.query
  }

  /// Every loaded issue, pages concatenated
  pub fn issues(&self) -> &[Issue] {
    &self.items
  }

  pub fn page_count(&self) -> usize {
    self.query.data().map(|p| p.pages.len()).unwrap_or(0)
  }

  pub fn next_page_param(&self) -> Option<u32> {
    self.query.data().and_then(InfinitePages::next_page_param)
  }

  /// More pages may exist
  pub fn has_next_page(&self) -> bool {
    self.next_page_param().is_some()
  }

  pub fn is_fetching_next_page(&self) -> bool {
    self.fetching_next && self.query.is_fetching()
  }

  pub fn set_filter(&mut self, filter: IssueFilter) {
    if filter == self.filter {
      return;
    }
    self.filter = filter;
    self.fetching_next = false;
    self.query = pages_query(&self.source, &self.cache, &self.filter);
    self.query.fetch();
    self.sync_items();
  }

  pub fn set_state(&mut self, state: StateFilter) {
    let mut filter = self.filter.clone();
    filter.set_state(state);
    self.set_filter(filter);
  }

  pub fn toggle_label(&mut self, name: &str) {
    let mut filter = self.filter.clone();
    filter.toggle_label(name);
    self.set_filter(filter);
  }

  /// Fetch and append the next page.
  ///
  /// No-op once the list is exhausted, before the first page arrived, or
  /// while any fetch for this list is running.
  pub fn fetch_next_page(&mut self) -> bool {
    if self.query.is_fetching() || self.next_page_param().is_none() {
      return false;
    }

    let key = self.query.key().clone();
    let source = self.source.clone();
    let cache = self.cache.clone();
    let filter = self.filter.clone();
    let pages_key = key.clone();
    self.cache.fetch_in_background(
      key,
      move || {
        let source = source.clone();
        let cache = cache.clone();
        let filter = filter.clone();
        let key = pages_key.clone();
        async move {
          let mut pages = cache
            .get::<InfinitePages<Issue>>(&key)
            .map(|entry| entry.data)
            .unwrap_or_default();
          let Some(param) = pages.next_page_param() else {
            return Ok(pages);
          };
          let page = source
            .get_issues(&filter, param)
            .await
            .map_err(|e| e.to_string())?;
          pages.push(param, page);
          Ok(pages)
        }
      },
      FetchOptions::stale_after(INFINITE_STALE_TIME),
    );

    self.fetching_next = true;
    self.query.poll();
    true
  }

  pub fn refetch(&mut self) {
    self.fetching_next = false;
    self.query.refetch();
  }

  pub fn poll(&mut self) -> bool {
    if !self.query.poll() {
      return false;
    }
    if !self.query.is_fetching() {
      self.fetching_next = false;
    }
    self.sync_items();
    true
  }

  fn sync_items(&mut self) {
    self.items = self
      .query
      .data()
      .map(|pages| pages.items().cloned().collect())
      .unwrap_or_default();
  }
}

/// Query over every page of `filter`.
///
/// A (re)load fetches every page already loaded, in order, starting from the
/// first page when there are none.
fn pages_query<S: IssueSource>(
  source: &S,
  cache: &GithubCache,
  filter: &IssueFilter,
) -> Query<InfinitePages<Issue>> {
  let key = GithubQueryKey::IssuesInfinite {
    filter: filter.clone(),
  };
  let source = source.clone();
  let loader_cache = cache.clone();
  let loader_key = key.clone();
  let filter = filter.clone();

  Query::new(
    cache.clone(),
    key,
    FetchOptions::stale_after(INFINITE_STALE_TIME),
    move || {
      let source = source.clone();
      let cache = loader_cache.clone();
      let key = loader_key.clone();
      let filter = filter.clone();
      async move {
        let params = cache
          .get::<InfinitePages<Issue>>(&key)
          .map(|entry| entry.data.page_params)
          .filter(|params| !params.is_empty())
          .unwrap_or_else(|| vec![FIRST_PAGE]);

        let mut pages = InfinitePages::default();
        for param in params {
          let page = source
            .get_issues(&filter, param)
            .await
            .map_err(|e| e.to_string())?;
          pages.push(param, page);
        }
        Ok(pages)
      }
    },
  )
}
