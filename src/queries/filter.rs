use crate::github::types::StateFilter;
use std::collections::BTreeSet;

/// Client-side filter for issue lists.
///
/// Both parts are sent to GitHub as query parameters and combined with a
/// logical AND server-side. Labels are kept sorted so that two filters with
/// the same selection are equal, whatever the order of selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IssueFilter {
  pub state: StateFilter,
  pub labels: BTreeSet<String>,
}

impl IssueFilter {
  pub fn set_state(&mut self, state: StateFilter) {
    self.state = state;
  }

  /// Select `name` if unselected, deselect it otherwise
  pub fn toggle_label(&mut self, name: &str) {
    if !self.labels.remove(name) {
      self.labels.insert(name.to_string());
    }
  }

  pub fn is_selected(&self, name: &str) -> bool {
    self.labels.contains(name)
  }

  /// Comma-joined label names for the `labels` query parameter
  pub fn labels_param(&self) -> String {
    self
      .labels
      .iter()
      .map(String::as_str)
      .collect::<Vec<_>>()
      .join(",")
  }

  /// Short description for titles and logs
  pub fn describe(&self) -> String {
    if self.labels.is_empty() {
      self.state.label().to_string()
    } else {
      format!("{} + {}", self.state.label(), self.labels_param())
    }
  }
}
