/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "devices",
    aliases: &["d", "dev", "list"],
    description: "Browse registered scale devices",
  },
  Command {
    name: "device",
    aliases: &["open"],
    description: "Open a device by id (device <id>)",
  },
  Command {
    name: "logout",
    aliases: &["lo"],
    description: "Drop the session and cached data",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit s9s",
  },
];

/// Split palette input into a command word and an optional argument.
pub fn split_command(input: &str) -> (&str, Option<&str>) {
  let trimmed = input.trim();
  match trimmed.split_once(char::is_whitespace) {
    Some((word, rest)) => {
      let rest = rest.trim();
      (word, if rest.is_empty() { None } else { Some(rest) })
    }
    None => (trimmed, None),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  // Only the command word participates in matching; arguments don't.
  let (word, _) = split_command(input);
  let input_lower = word.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
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
    let suggestions = get_suggestions("devices");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "devices");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("d");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "devices");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("dev");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "devices");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("uit");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "quit");
  }

  #[test]
  fn test_argument_does_not_affect_matching() {
    let suggestions = get_suggestions("device 3");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "device");
  }

  #[test]
  fn test_split_command() {
    assert_eq!(split_command("devices"), ("devices", None));
    assert_eq!(split_command("device 3"), ("device", Some("3")));
    assert_eq!(split_command("  device   3  "), ("device", Some("3")));
    assert_eq!(split_command(""), ("", None));
  }
}
