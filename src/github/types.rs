use chrono::{DateTime, Utc};
use serde::Deserialize;

/// State of a single issue as reported by GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
  Open,
  Closed,
}

/// State filter applied to issue lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateFilter {
  #[default]
  All,
  Open,
  Closed,
}

impl StateFilter {
  /// Value of the `state` query parameter, `None` when every state is wanted
  pub fn as_param(&self) -> Option<&'static str> {
    match self {
      StateFilter::All => None,
      StateFilter::Open => Some("open"),
      StateFilter::Closed => Some("closed"),
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      StateFilter::All => "All",
      StateFilter::Open => "Open",
      StateFilter::Closed => "Closed",
    }
  }

  /// Next filter in tab order, wrapping around
  pub fn cycle(&self) -> Self {
    match self {
      StateFilter::All => StateFilter::Open,
      StateFilter::Open => StateFilter::Closed,
      StateFilter::Closed => StateFilter::All,
    }
  }

  pub fn all_variants() -> &'static [Self] {
    &[StateFilter::All, StateFilter::Open, StateFilter::Closed]
  }
}

/// Issue author or commenter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
  pub login: String,
  #[serde(default)]
  pub avatar_url: String,
}

/// Repository label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
  pub id: u64,
  pub name: String,
  /// Hex colour without the leading `#`
  #[serde(default)]
  pub color: String,
  pub description: Option<String>,
}

/// Issue as returned by both the list and the detail endpoints.
///
/// The list endpoint already carries every field the list view shows, so a
/// list item doubles as a partial detail value when seeding the cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
  pub id: u64,
  pub number: u64,
  pub title: String,
  pub state: IssueState,
  pub created_at: DateTime<Utc>,
  pub user: User,
  #[serde(default)]
  pub comments: u64,
  #[serde(default)]
  pub labels: Vec<Label>,
  pub body: Option<String>,
  pub html_url: Option<String>,
}

/// Issue comment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
  pub id: u64,
  pub user: User,
  #[serde(default)]
  pub body: String,
  pub created_at: DateTime<Utc>,
}
