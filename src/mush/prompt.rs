//! Pending interactive prompts.
//!
//! A command that needs more input from the player stores a [`PendingPrompt`]
//! on the session and returns its question. The next line the player sends is
//! routed to the prompt instead of the command parser.
//!
//! | Prompt              | Empty reply         | Non-empty reply                    |
//! |---------------------|---------------------|------------------------------------|
//! | `ExploreRoomName`   | re-prompt           | dig the room                       |
//! | `HomeName`          | re-prompt           | ask `HomeDescription`              |
//! | `HomeDescription`   | build home, no desc | build home; too long asks again    |
//! | `FlavourText`       | abort, leave unset  | write the attribute once           |
//! | `ConfirmCreateItem` | abort               | `yes`/`y` creates, anything aborts |

use crate::mush::resolver::Target;
use crate::mush::types::{Attribute, Direction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingPrompt {
    ExploreRoomName {
        direction: Direction,
    },
    ConfirmCreateItem {
        name: String,
    },
    FlavourText {
        target: Target,
        target_name: String,
        attribute: Attribute,
    },
    HomeName,
    HomeDescription {
        name: String,
    },
}

impl PendingPrompt {
    /// Question shown when the prompt is first raised.
    pub fn question(&self) -> String {
        match self {
            PendingPrompt::ExploreRoomName { .. } => "What is this place called?".to_string(),
            PendingPrompt::ConfirmCreateItem { name } => format!(
                "There is no {} here. Would you like to create it? (yes/no)",
                name
            ),
            PendingPrompt::FlavourText {
                target_name,
                attribute,
                ..
            } => attribute.prompt(target_name),
            PendingPrompt::HomeName => {
                "You don't have a home yet. Let's make one. What is the name of your home?"
                    .to_string()
            }
            PendingPrompt::HomeDescription { name } => format!(
                "(Optional) How would you describe {}? Add some flavour to your description.",
                name
            ),
        }
    }

    /// Question repeated after an empty reply, for prompts that insist.
    pub fn reprompt(&self) -> Option<String> {
        match self {
            PendingPrompt::ExploreRoomName { .. } => Some(
                "You must supply a new room name.\nWhat is this place called?".to_string(),
            ),
            PendingPrompt::HomeName => {
                Some("You must provide a name for your new home.".to_string())
            }
            _ => None,
        }
    }
}

/// Trimmed reply text, or `None` for a blank line.
pub fn reply_text(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Case-insensitive `yes` / `y`.
pub fn is_affirmative(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_answers() {
        for yes in ["yes", "Y", " YES ", "y"] {
            assert!(is_affirmative(yes), "{}", yes);
        }
        for no in ["no", "", "yeah", "n", "yes please"] {
            assert!(!is_affirmative(no), "{}", no);
        }
    }

    #[test]
    fn blank_replies_are_none() {
        assert_eq!(reply_text("   \t"), None);
        assert_eq!(reply_text("  Hall  "), Some("Hall"));
    }

    #[test]
    fn only_naming_prompts_insist() {
        assert!(PendingPrompt::ExploreRoomName {
            direction: Direction::North
        }
        .reprompt()
        .is_some());
        assert!(PendingPrompt::HomeName.reprompt().is_some());
        assert!(PendingPrompt::ConfirmCreateItem {
            name: "cup".into()
        }
        .reprompt()
        .is_none());
        assert!(PendingPrompt::HomeDescription {
            name: "Den".into()
        }
        .reprompt()
        .is_none());
    }

    #[test]
    fn flavour_question_names_target() {
        let prompt = PendingPrompt::FlavourText {
            target: Target::Item("abc".into()),
            target_name: "apple".into(),
            attribute: Attribute::Taste,
        };
        assert_eq!(prompt.question(), "What does apple taste like?");
    }
}
