use std::time::Duration;

use crate::cache::FetchOptions;
use crate::github::types::{Issue, StateFilter};
use crate::github::{GithubCache, GithubQueryKey, IssueSource};
use crate::query::Query;

use super::IssueFilter;

/// Pages are stale at once: revisiting a page shows the cached copy while it
/// is fetched again
pub const PAGE_STALE_TIME: Duration = Duration::ZERO;

/// 1-based page counter with a floor at page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
  page: u32,
}

impl Default for PageCursor {
  fn default() -> Self {
    Self::new()
  }
}

impl PageCursor {
  pub fn new() -> Self {
    Self { page: 1 }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  /// Advance unless the current page is known to be empty or not loaded yet.
  ///
  /// `current_len` is the size of the current page, `None` while loading.
  /// Returns whether the page changed.
  pub fn next(&mut self, current_len: Option<usize>) -> bool {
    match current_len {
      Some(len) if len > 0 => {
        self.page += 1;
        true
      }
      _ => false,
    }
  }

  /// Step back, never below page 1
  pub fn previous(&mut self) -> bool {
    if self.page > 1 {
      self.page -= 1;
      true
    } else {
      false
    }
  }

  pub fn reset(&mut self) {
    self.page = 1;
  }
}

/// Issue list navigated one page at a time.
///
/// Owns the filter and page counter; each `(filter, page)` pair has its own
/// cache entry.
pub struct PagedIssues<S: IssueSource> {
  source: S,
  cache: GithubCache,
  filter: IssueFilter,
  cursor: PageCursor,
  query: Query<Vec<Issue>>,
}

impl<S: IssueSource> PagedIssues<S> {
  pub fn new(source: S, cache: GithubCache, filter: IssueFilter) -> Self {
    let cursor = PageCursor::new();
    let mut query = page_query(&source, &cache, &filter, cursor.page());
    query.fetch();

    Self {
      source,
      cache,
      filter,
      cursor,
      query,
    }
  }

  pub fn filter(&self) -> &IssueFilter {
    &self.filter
  }

  pub fn page(&self) -> u32 {
    self.cursor.page()
  }

  pub fn query(&self) -> &Query<Vec<Issue>> {
    &self.query
  }

  pub fn issues(&self) -> &[Issue] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Replace the filter; any change sends the list back to page 1
  pub fn set_filter(&mut self, filter: IssueFilter) {
    if filter == self.filter {
      return;
    }
    self.filter = filter;
    self.cursor.reset();
    self.load_page();
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

  /// Go to the next page; no-op after an empty page
  pub fn next(&mut self) -> bool {
    let current_len = self.query.data().map(Vec::len);
    if !self.cursor.next(current_len) {
      return false;
    }
    self.load_page();
    true
  }

  /// Go to the previous page; no-op on page 1
  pub fn previous(&mut self) -> bool {
    if !self.cursor.previous() {
      return false;
    }
    self.load_page();
    true
  }

  pub fn refetch(&mut self) {
    self.query.refetch();
  }

  pub fn poll(&mut self) -> bool {
    self.query.poll()
  }

  fn load_page(&mut self) {
    self.query = page_query(&self.source, &self.cache, &self.filter, self.cursor.page());
    self.query.fetch();
  }
}

fn page_query<S: IssueSource>(
  source: &S,
  cache: &GithubCache,
  filter: &IssueFilter,
  page: u32,
) -> Query<Vec<Issue>> {
  let source = source.clone();
  let key = GithubQueryKey::Issues {
    filter: filter.clone(),
    page,
  };
  let filter = filter.clone();
  Query::new(
    cache.clone(),
    key,
    FetchOptions::stale_after(PAGE_STALE_TIME),
    move || {
      let source = source.clone();
      let filter = filter.clone();
      async move {
        source
          .get_issues(&filter, page)
          .await
          .map_err(|e| e.to_string())
      }
    },
  )
}
