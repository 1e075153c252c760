/// Commands reachable from command mode (`:`)

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "issues",
    aliases: &["i", "issue", "paged"],
    description: "Issue list, one page at a time",
  },
  Command {
    name: "infinite",
    aliases: &["inf", "scroll"],
    description: "Issue list with infinite scroll",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit gh9s",
  },
];

/// Get autocomplete suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input_lower).map(|rank| (cmd, rank)))
    .collect();

  matches.sort_by_key(|(_, rank)| *rank);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; `None` when the command does not match at all
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("infinite");
    assert_eq!(suggestions[0].name, "infinite");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("q");
    assert_eq!(suggestions[0].name, "quit");
  }

  #[test]
  fn test_prefix_match_prefers_name() {
    // "i" is an alias of issues and a prefix of infinite
    let suggestions = get_suggestions("i");
    assert_eq!(suggestions[0].name, "issues");
    assert_eq!(suggestions[1].name, "infinite");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("fin");
    assert_eq!(suggestions[0].name, "infinite");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("labels").is_empty());
  }
}
