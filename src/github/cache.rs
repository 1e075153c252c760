//! Cache keys for GitHub queries.

use crate::cache::CacheKey;
use crate::queries::IssueFilter;

/// Query key types for GitHub API calls.
///
/// Every variant carries all parameters of its request, so a late response
/// for one filter can never land in another filter's entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GithubQueryKey {
  /// One page of the paged issue list
  Issues { filter: IssueFilter, page: u32 },
  /// Accumulated pages of the infinite issue list
  IssuesInfinite { filter: IssueFilter },
  /// A single issue by number
  Issue { number: u64 },
  /// Comments of a single issue
  IssueComments { number: u64 },
  /// Repository labels
  Labels,
}

impl CacheKey for GithubQueryKey {
  fn description(&self) -> String {
    match self {
      Self::Issues { filter, page } => format!("issues [{}] page {}", filter.describe(), page),
      Self::IssuesInfinite { filter } => format!("issues [{}] infinite", filter.describe()),
      Self::Issue { number } => format!("issue #{}", number),
      Self::IssueComments { number } => format!("issue #{} comments", number),
      Self::Labels => "labels".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::github::types::StateFilter;

  #[test]
  fn test_keys_differ_by_filter() {
    let mut open = IssueFilter::default();
    open.set_state(StateFilter::Open);

    let all = GithubQueryKey::Issues {
      filter: IssueFilter::default(),
      page: 1,
    };
    let open = GithubQueryKey::Issues {
      filter: open,
      page: 1,
    };
    assert_ne!(all, open);
  }

  #[test]
  fn test_label_order_does_not_change_key() {
    let mut a = IssueFilter::default();
    a.toggle_label("bug");
    a.toggle_label("ui");
    let mut b = IssueFilter::default();
    b.toggle_label("ui");
    b.toggle_label("bug");

    assert_eq!(
      GithubQueryKey::IssuesInfinite { filter: a },
      GithubQueryKey::IssuesInfinite { filter: b }
    );
  }

  #[test]
  fn test_description() {
    assert_eq!(GithubQueryKey::Issue { number: 7 }.description(), "issue #7");
    assert_eq!(
      GithubQueryKey::Issues {
        filter: IssueFilter::default(),
        page: 2
      }
      .description(),
      "issues [All] page 2"
    );
  }
}
