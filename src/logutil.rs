//! Keeps player-typed text on one log line.
//! Room names, descriptions and raw command input can all carry newlines or
//! terminal escapes; everything user-supplied goes through [`escape_log`].

use std::fmt::{self, Write};

/// Characters kept before the text is clipped with an ellipsis.
const MAX_PREVIEW: usize = 300;

/// Writes its text with line breaks, tabs, backslashes and other control
/// characters spelled out, clipped at [`MAX_PREVIEW`] characters.
struct OneLine<'a>(&'a str);

impl fmt::Display for OneLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.0.chars();
        for ch in chars.by_ref().take(MAX_PREVIEW) {
            match ch {
                '\\' => f.write_str(r"\\")?,
                '\n' => f.write_str(r"\n")?,
                '\r' => f.write_str(r"\r")?,
                '\t' => f.write_str(r"\t")?,
                c if c.is_control() => write!(f, r"\x{:02X}", u32::from(c))?,
                c => f.write_char(c)?,
            }
        }
        if chars.next().is_some() {
            f.write_char('…')?;
        }
        Ok(())
    }
}

/// Player text made safe for a single log line.
pub fn escape_log(text: &str) -> String {
    OneLine(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::{escape_log, MAX_PREVIEW};

    #[test]
    fn spells_out_line_breaks_and_tabs() {
        let esc = escape_log("A damp cellar.\nIt smells\tof moss\r");
        assert_eq!(esc, r"A damp cellar.\nIt smells\tof moss\r");
        assert_eq!(escape_log(r"C:\cellar"), r"C:\\cellar");
    }

    #[test]
    fn spells_out_terminal_sequences() {
        assert_eq!(escape_log("\u{1b}[31mred"), r"\x1B[31mred");
    }

    #[test]
    fn clips_only_past_the_limit() {
        let exact = "x".repeat(MAX_PREVIEW);
        assert_eq!(escape_log(&exact), exact);

        let esc = escape_log(&"x".repeat(MAX_PREVIEW + 100));
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
        assert!(esc.ends_with('…'));
    }
}
