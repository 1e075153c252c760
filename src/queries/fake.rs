//! In-memory issue source for tests.

use chrono::{TimeZone, Utc};
use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex};

use crate::github::types::{Comment, Issue, IssueState, Label, User};
use crate::github::IssueSource;

use super::IssueFilter;

#[derive(Debug, Default)]
struct FakeState {
  requests: Vec<(IssueFilter, u32)>,
  issue_calls: u32,
  comment_calls: u32,
  label_calls: u32,
}

/// Serves `total_pages` pages of `page_size` issues, then empty pages.
#[derive(Clone)]
pub struct FakeSource {
  page_size: usize,
  total_pages: u32,
  fail_issue: bool,
  fail_comments: bool,
  state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
  pub fn new(page_size: usize, total_pages: u32) -> Self {
    Self {
      page_size,
      total_pages,
      fail_issue: false,
      fail_comments: false,
      state: Arc::new(Mutex::new(FakeState::default())),
    }
  }

  pub fn failing_issue(mut self) -> Self {
    self.fail_issue = true;
    self
  }

  pub fn failing_comments(mut self) -> Self {
    self.fail_comments = true;
    self
  }

  /// Every `(filter, page)` passed to `get_issues`, in call order
  pub fn requests(&self) -> Vec<(IssueFilter, u32)> {
    self.state.lock().unwrap().requests.clone()
  }

  pub fn requested_pages(&self) -> Vec<u32> {
    self.requests().into_iter().map(|(_, page)| page).collect()
  }

  pub fn issue_calls(&self) -> u32 {
    self.state.lock().unwrap().issue_calls
  }

  pub fn comment_calls(&self) -> u32 {
    self.state.lock().unwrap().comment_calls
  }

  pub fn label_calls(&self) -> u32 {
    self.state.lock().unwrap().label_calls
  }
}

/// Issue as the list endpoint would return it
pub fn list_issue(number: u64) -> Issue {
  Issue {
    id: 1000 + number,
    number,
    title: format!("Issue {}", number),
    state: IssueState::Open,
    created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    user: User {
      login: "octocat".to_string(),
      avatar_url: String::new(),
    },
    comments: 2,
    labels: Vec::new(),
    body: None,
    html_url: None,
  }
}

/// Issue as the detail endpoint would return it
pub fn full_issue(number: u64) -> Issue {
  Issue {
    body: Some(format!("Body of issue {}", number)),
    ..list_issue(number)
  }
}

impl IssueSource for FakeSource {
  async fn get_issues(&self, filter: &IssueFilter, page: u32) -> Result<Vec<Issue>> {
    self
      .state
      .lock()
      .unwrap()
      .requests
      .push((filter.clone(), page));

    if page == 0 || page > self.total_pages {
      return Ok(Vec::new());
    }
    let first = (page as u64 - 1) * self.page_size as u64 + 1;
    Ok((first..first + self.page_size as u64).map(list_issue).collect())
  }

  async fn get_issue(&self, number: u64) -> Result<Issue> {
    self.state.lock().unwrap().issue_calls += 1;
    if self.fail_issue {
      return Err(eyre!("GET /issues/{} returned 502 Bad Gateway", number));
    }
    Ok(full_issue(number))
  }

  async fn get_issue_comments(&self, number: u64) -> Result<Vec<Comment>> {
    self.state.lock().unwrap().comment_calls += 1;
    if self.fail_comments {
      return Err(eyre!("GET /issues/{}/comments returned 502 Bad Gateway", number));
    }
    Ok(vec![Comment {
      id: number * 10,
      user: User {
        login: "hubot".to_string(),
        avatar_url: String::new(),
      },
      body: "Looks good".to_string(),
      created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    }])
  }

  async fn get_labels(&self) -> Result<Vec<Label>> {
    self.state.lock().unwrap().label_calls += 1;
    Ok(vec![
      Label {
        id: 1,
        name: "bug".to_string(),
        color: "d73a4a".to_string(),
        description: Some("Something isn't working".to_string()),
      },
      Label {
        id: 2,
        name: "enhancement".to_string(),
        color: "a2eeef".to_string(),
        description: None,
      },
    ])
  }
}
