use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

use crate::github::types::IssueState;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn state_color(state: IssueState) -> Color {
  match state {
    IssueState::Open => Color::Green,
    IssueState::Closed => Color::Red,
  }
}

pub fn state_icon(state: IssueState) -> &'static str {
  match state {
    IssueState::Open => "●",
    IssueState::Closed => "✔",
  }
}

/// Parse a GitHub label colour ("d73a4a", no leading `#`)
pub fn label_color(hex: &str) -> Color {
  let hex = hex.trim_start_matches('#');
  if hex.len() != 6 {
    return Color::Gray;
  }
  let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
  match (channel(0), channel(2), channel(4)) {
    (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
    _ => Color::Gray,
  }
}

/// Relative age like "3 days ago"
pub fn time_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let seconds = (now - then).num_seconds().max(0);

  let (amount, unit) = match seconds {
    s if s >= 365 * 86_400 => (s / (365 * 86_400), "year"),
    s if s >= 30 * 86_400 => (s / (30 * 86_400), "month"),
    s if s >= 86_400 => (s / 86_400, "day"),
    s if s >= 3_600 => (s / 3_600, "hour"),
    s if s >= 60 => (s / 60, "minute"),
    _ => return "just now".to_string(),
  };

  if amount == 1 {
    format!("1 {} ago", unit)
  } else {
    format!("{} {}s ago", amount, unit)
  }
}
