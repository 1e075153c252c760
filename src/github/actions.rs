//! One action per remote operation.
//!
//! Every action waits a fixed simulated latency, performs exactly one GET and
//! hands back the decoded payload. Failures propagate untouched: retries are
//! a cache concern, not an action concern.

use color_eyre::Result;
use std::future::Future;

use crate::config::{Config, LatencyConfig};
use crate::queries::IssueFilter;

use super::client::GithubClient;
use super::types::{Comment, Issue, Label};

/// Source of issue data consumed by the query hooks
pub trait IssueSource: Clone + Send + Sync + 'static {
  /// One page (1-based) of issues matching the filter
  fn get_issues(
    &self,
    filter: &IssueFilter,
    page: u32,
  ) -> impl Future<Output = Result<Vec<Issue>>> + Send;

  fn get_issue(&self, number: u64) -> impl Future<Output = Result<Issue>> + Send;

  fn get_issue_comments(&self, number: u64) -> impl Future<Output = Result<Vec<Comment>>> + Send;

  fn get_labels(&self) -> impl Future<Output = Result<Vec<Label>>> + Send;
}

/// Actions backed by the GitHub REST API
#[derive(Clone)]
pub struct GithubActions {
  client: GithubClient,
  latency: LatencyConfig,
  per_page: Option<u32>,
}

impl GithubActions {
  pub fn new(config: &Config) -> Result<Self> {
    Ok(Self {
      client: GithubClient::new(config)?,
      latency: config.latency,
      per_page: config.github.per_page,
    })
  }
}

impl IssueSource for GithubActions {
  async fn get_issues(&self, filter: &IssueFilter, page: u32) -> Result<Vec<Issue>> {
    tokio::time::sleep(self.latency.issues()).await;
    let query = issues_query(filter, page, self.per_page);
    self.client.get("/issues", &query).await
  }

  async fn get_issue(&self, number: u64) -> Result<Issue> {
    tokio::time::sleep(self.latency.issue()).await;
    self.client.get(&format!("/issues/{}", number), &[]).await
  }

  async fn get_issue_comments(&self, number: u64) -> Result<Vec<Comment>> {
    tokio::time::sleep(self.latency.comments()).await;
    self
      .client
      .get(&format!("/issues/{}/comments", number), &[])
      .await
  }

  async fn get_labels(&self) -> Result<Vec<Label>> {
    tokio::time::sleep(self.latency.labels()).await;
    self.client.get("/labels", &[]).await
  }
}

/// Query parameters for `GET /issues`
pub fn issues_query(
  filter: &IssueFilter,
  page: u32,
  per_page: Option<u32>,
) -> Vec<(&'static str, String)> {
  let mut query = Vec::new();
  if let Some(state) = filter.state.as_param() {
    query.push(("state", state.to_string()));
  }
  if !filter.labels.is_empty() {
    query.push(("labels", filter.labels_param()));
  }
  query.push(("page", page.to_string()));
  if let Some(per_page) = per_page {
    query.push(("per_page", per_page.to_string()));
  }
  query
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::github::types::StateFilter;

  #[test]
  fn test_all_state_is_omitted() {
    let filter = IssueFilter::default();
    let query = issues_query(&filter, 1, None);
    assert_eq!(query, vec![("page", "1".to_string())]);
  }

  #[test]
  fn test_state_labels_and_page() {
    let mut filter = IssueFilter::default();
    filter.set_state(StateFilter::Closed);
    filter.toggle_label("ui");
    filter.toggle_label("bug");

    let query = issues_query(&filter, 3, Some(5));
    assert_eq!(
      query,
      vec![
        ("state", "closed".to_string()),
        ("labels", "bug,ui".to_string()),
        ("page", "3".to_string()),
        ("per_page", "5".to_string()),
      ]
    );
  }
}
