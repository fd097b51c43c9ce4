//! Name and free-text validation for player input

use std::collections::HashSet;

/// Name validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("A name is required.")]
    Empty,

    #[error("Name is too short (minimum {min} characters).")]
    TooShort { min: usize },

    #[error("That is too long (maximum {max} characters).")]
    TooLong { max: usize },

    #[error("Names cannot contain control characters.")]
    ControlCharacters,

    #[error("Player names may only use letters, digits, '_', '-' and '.'; found: {chars}")]
    InvalidCharacters { chars: String },

    #[error("That name is reserved.")]
    Reserved,
}

/// Player name validation rules
#[derive(Debug, Clone)]
pub struct PlayerNameRules {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PlayerNameRules {
    fn default() -> Self {
        PlayerNameRules {
            min_length: 2,
            max_length: 30,
        }
    }
}

/// Names that would collide with self-references or command words
fn reserved_names() -> HashSet<&'static str> {
    [
        "me", "self", "here", "admin", "administrator", "root", "system", "guest",
        "anonymous", "look", "get", "grab", "drop", "explore", "map", "home", "sethome",
        "describe", "taste", "touch", "smell", "help", "quit", "inventory",
    ]
    .iter()
    .copied()
    .collect()
}

/// Validate a player name according to the given rules
pub fn validate_player_name(name: &str, rules: &PlayerNameRules) -> Result<String, NameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() < rules.min_length {
        return Err(NameError::TooShort {
            min: rules.min_length,
        });
    }
    if trimmed.chars().count() > rules.max_length {
        return Err(NameError::TooLong {
            max: rules.max_length,
        });
    }
    if reserved_names().contains(trimmed.to_lowercase().as_str()) {
        return Err(NameError::Reserved);
    }

    let invalid: HashSet<char> = trimmed
        .chars()
        .filter(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || *ch == '.'))
        .collect();
    if !invalid.is_empty() {
        let mut chars: Vec<char> = invalid.into_iter().collect();
        chars.sort_unstable();
        return Err(NameError::InvalidCharacters {
            chars: chars.into_iter().collect(),
        });
    }

    Ok(trimmed.to_string())
}

/// Validate a room or item name: trimmed, non-empty, single line, bounded length.
/// Inner runs of whitespace collapse to one space.
pub fn validate_object_name(name: &str, max_length: usize) -> Result<String, NameError> {
    if name.chars().any(|c| c.is_control() && c != '\t') {
        return Err(NameError::ControlCharacters);
    }
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(NameError::Empty);
    }
    if collapsed.chars().count() > max_length {
        return Err(NameError::TooLong { max: max_length });
    }
    Ok(collapsed)
}

/// Sanitize free text (descriptions, tastes, smells): strips control characters
/// except newlines and tabs, trims, and bounds the length.
pub fn sanitize_text(text: &str, max_length: usize) -> Result<String, NameError> {
    let sanitized: String = text
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect();
    let sanitized = sanitized.trim().to_string();
    if sanitized.chars().count() > max_length {
        return Err(NameError::TooLong { max: max_length });
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_names() {
        let rules = PlayerNameRules::default();
        assert_eq!(validate_player_name(" alice ", &rules), Ok("alice".to_string()));
        assert_eq!(validate_player_name("a", &rules), Err(NameError::TooShort { min: 2 }));
        assert_eq!(validate_player_name("Me", &rules), Err(NameError::Reserved));
        assert!(matches!(
            validate_player_name("bad/name", &rules),
            Err(NameError::InvalidCharacters { .. })
        ));
        assert_eq!(validate_player_name("   ", &rules), Err(NameError::Empty));
    }

    #[test]
    fn object_names_collapse_whitespace() {
        assert_eq!(
            validate_object_name("  The   Old  Mill ", 60),
            Ok("The Old Mill".to_string())
        );
        assert_eq!(validate_object_name("", 60), Err(NameError::Empty));
        assert_eq!(validate_object_name("abcdef", 5), Err(NameError::TooLong { max: 5 }));
        assert_eq!(
            validate_object_name("evil\u{7}bell", 60),
            Err(NameError::ControlCharacters)
        );
    }

    #[test]
    fn text_keeps_newlines_and_drops_other_controls() {
        assert_eq!(
            sanitize_text("Line one\nLine\u{1b}two ", 100),
            Ok("Line one\nLinetwo".to_string())
        );
        assert!(sanitize_text(&"x".repeat(11), 10).is_err());
    }
}
