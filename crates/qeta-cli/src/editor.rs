//! Interactive editing support
//!
//! Opens $EDITOR for composing question and answer bodies.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

/// Open markdown content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors. Empty results
/// abort the command.
pub fn compose(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("qeta_edit_{}.md", std::process::id()));
    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor));

    let content = match status {
        Ok(status) if status.success() => fs::read_to_string(&temp_path)
            .with_context(|| format!("Failed to read edited file: {:?}", temp_path)),
        Ok(_) => Err(anyhow::anyhow!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        )),
        Err(e) => Err(e),
    };
    let _ = fs::remove_file(&temp_path);

    let content = content?.trim().to_string();
    if content.is_empty() {
        bail!("Aborted: empty content");
    }
    Ok(content)
}

/// Use `given` if present, otherwise compose in the editor
pub fn body_or_compose(given: Option<String>, initial_content: &str) -> Result<String> {
    match given {
        Some(body) => Ok(body),
        None => compose(initial_content),
    }
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "notepad"];
    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Pass the text with --body or set $EDITOR.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
