//! Interactive prompts.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Ask for an install location, pre-filled with `current`.
///
/// Returns `None` when the user keeps the current path, clears the line, or
/// aborts with Ctrl-C / Ctrl-D.
pub fn choose_directory(current: &str) -> Result<Option<String>> {
    let mut editor = DefaultEditor::new()?;
    match editor.readline_with_initial("Install location: ", (current, "")) {
        Ok(answer) => Ok(interpret_answer(&answer, current)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Ask a yes/no question. Anything but an explicit yes counts as no.
pub fn confirm(question: &str) -> Result<bool> {
    let mut editor = DefaultEditor::new()?;
    match editor.readline(&format!("{} [y/N] ", question)) {
        Ok(answer) => Ok(is_yes(&answer)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn interpret_answer(answer: &str, current: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() || answer == current {
        None
    } else {
        Some(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_answer() {
        assert_eq!(interpret_answer("", "/mc"), None);
        assert_eq!(interpret_answer("  /mc ", "/mc"), None);
        assert_eq!(
            interpret_answer("/games/mc\n", "/mc"),
            Some("/games/mc".to_string())
        );
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }
}
